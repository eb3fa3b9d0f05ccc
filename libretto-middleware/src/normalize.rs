use libretto_core::{ContentPart, Message, MessageContent, Role};

#[derive(Debug, Clone, PartialEq)]
pub struct PromptModification {
    pub modified_prompt: Vec<Message>,
    pub has_chat_history: bool,
}

/// Drops every message's provider metadata and retags flagged messages as `chat_history`.
///
/// The metadata bag must not reach the template resolver or the provider, so it is removed
/// from all messages, flagged or not. Order and count are preserved.
pub fn modify_prompt_for_chat_history(prompt: Vec<Message>) -> PromptModification {
    let mut has_chat_history = false;
    let modified_prompt = prompt
        .into_iter()
        .map(|mut message| {
            let flagged = message.is_flagged_chat_history();
            message.provider_metadata = None;
            if flagged {
                message.role = Role::ChatHistory;
                has_chat_history = true;
            }
            message
        })
        .collect();

    PromptModification {
        modified_prompt,
        has_chat_history,
    }
}

/// Wraps bare string content of non-system messages into a single text part.
///
/// Resolved chat history only carries string content, while the prompt handed back to the
/// provider is expected to use structured parts throughout.
pub fn standardize_chat_history(messages: Vec<Message>) -> Vec<Message> {
    messages
        .into_iter()
        .map(|mut message| {
            if message.role != Role::System {
                if let MessageContent::Text(text) = &mut message.content {
                    let text = std::mem::take(text);
                    message.content = MessageContent::Parts(vec![ContentPart::Text { text }]);
                }
            }
            message
        })
        .collect()
}
