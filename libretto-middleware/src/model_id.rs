/// Model ids arrive either bare (`gpt-4o-mini`) or prefixed (`models/gemini-2.0-flash`).
/// Everything after the first `/` is kept, so `accounts/fireworks/llama` yields
/// `fireworks/llama` rather than only the second segment.
pub fn parse_model_id(model_id: &str) -> &str {
    match model_id.split_once('/') {
        Some((_, rest)) => rest,
        None => model_id,
    }
}

/// Strips the driver suffix the calling SDK appends to provider ids (`openai.chat`).
pub fn provider_name(provider: &str) -> &str {
    provider.split('.').next().unwrap_or(provider)
}
