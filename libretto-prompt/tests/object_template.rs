use serde_json::json;

use libretto_core::{ContentPart, Message, MessageContent, Role, TemplateParams};
use libretto_prompt::{ObjectTemplate, ObjectTemplateResolver, TemplateResolver};

fn params(value: serde_json::Value) -> TemplateParams {
    serde_json::from_value(value).unwrap()
}

#[test]
fn substitutes_string_and_part_content() {
    let template = ObjectTemplate::new(vec![
        Message::system("You are a helpful assistant that addresses people in a {tone} tone."),
        Message::user(vec![ContentPart::text("Hello, my name is {name}")]),
    ]);
    let vars = params(json!({"name": "Jamie", "tone": "funny"}));

    let messages = template.format_messages(&vars).unwrap();

    assert_eq!(
        messages[0].content,
        MessageContent::Text(
            "You are a helpful assistant that addresses people in a funny tone.".to_string()
        )
    );
    assert_eq!(
        messages[1].content,
        MessageContent::Parts(vec![ContentPart::text("Hello, my name is Jamie")])
    );
}

#[test]
fn chat_history_slot_expands_each_placeholder_in_order() {
    let template = ObjectTemplate::new(vec![
        Message::system("Supervisor"),
        Message::new(Role::ChatHistory, "{prev_messages} {second_history}"),
        Message::user("{coach_question}"),
    ]);
    let vars = params(json!({
        "prev_messages": [
            {"role": "user", "content": "I am not feeling very good."},
            {"role": "assistant", "content": "I am sorry to hear that."}
        ],
        "second_history": [
            {"role": "user", "content": "Thank you for the kind words."},
            {"role": "assistant", "content": "You're welcome"}
        ],
        "coach_question": "How do I help my team?"
    }));

    let messages = template.format_messages(&vars).unwrap();

    let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            Role::System,
            Role::User,
            Role::Assistant,
            Role::User,
            Role::Assistant,
            Role::User
        ]
    );
    assert_eq!(messages[3].content.as_text(), Some("Thank you for the kind words."));
    assert_eq!(messages[5].content.as_text(), Some("How do I help my team?"));
}

#[test]
fn chat_history_skips_malformed_entries_and_missing_params() {
    let template = ObjectTemplate::new(vec![Message::new(
        Role::ChatHistory,
        "{history} {absent}",
    )]);
    let vars = params(json!({
        "history": [
            {"content": "no role"},
            {"role": "user", "content": "kept"}
        ]
    }));

    let messages = template.format_messages(&vars).unwrap();

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content.as_text(), Some("kept"));
}

#[test]
fn chat_history_accepts_single_message_object() {
    let template = ObjectTemplate::new(vec![Message::new(Role::ChatHistory, "{turn}")]);
    let vars = params(json!({"turn": {"role": "assistant", "content": "solo"}}));

    let messages = template.format_messages(&vars).unwrap();

    assert_eq!(messages, vec![Message::assistant("solo")]);
}

#[test]
fn resolver_returns_unresolved_template() {
    let original = vec![Message::user("Hello {name}")];
    let resolved = ObjectTemplateResolver
        .resolve(
            ObjectTemplate::new(original.clone()),
            &params(json!({"name": "Jamie"})),
        )
        .unwrap();

    assert_eq!(resolved.template, original);
    assert_eq!(resolved.messages, vec![Message::user("Hello Jamie")]);
}
