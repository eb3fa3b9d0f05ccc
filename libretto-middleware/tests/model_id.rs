use libretto_middleware::{parse_model_id, provider_name};

#[test]
fn returns_model_after_slash() {
    assert_eq!(parse_model_id("models/gpt-4"), "gpt-4");
    assert_eq!(parse_model_id("openai/gpt-3.5-turbo"), "gpt-3.5-turbo");
    assert_eq!(parse_model_id("models/gemini-2.0-flash-exp"), "gemini-2.0-flash-exp");
}

#[test]
fn keeps_everything_after_first_slash() {
    assert_eq!(parse_model_id("accounts/fireworks/llama"), "fireworks/llama");
}

#[test]
fn returns_model_unchanged_without_slash() {
    assert_eq!(parse_model_id("gpt-4"), "gpt-4");
    assert_eq!(parse_model_id("claude-3"), "claude-3");
    assert_eq!(parse_model_id(""), "");
}

#[test]
fn provider_drops_driver_suffix() {
    assert_eq!(provider_name("openai.chat"), "openai");
    assert_eq!(provider_name("google.generative-ai"), "google");
    assert_eq!(provider_name("groq"), "groq");
}
