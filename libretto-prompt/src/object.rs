use libretto_core::{
    ContentPart, LibrettoError, Message, MessageContent, Role, TemplateParams, Value,
};

use crate::PromptTemplate;

/// A chat prompt whose messages may contain `{name}` placeholders and `chat_history` slots.
#[derive(Debug, Clone)]
pub struct ObjectTemplate {
    messages: Vec<Message>,
}

impl ObjectTemplate {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    pub fn format_messages(&self, vars: &TemplateParams) -> Result<Vec<Message>, LibrettoError> {
        let mut result = Vec::with_capacity(self.messages.len());
        for message in &self.messages {
            if message.role == Role::ChatHistory {
                result.extend(expand_chat_history(message, vars)?);
            } else {
                result.push(render_message(message, vars)?);
            }
        }
        Ok(result)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPrompt {
    /// Concrete messages with every placeholder substituted.
    pub messages: Vec<Message>,
    /// The unresolved template the messages were produced from.
    pub template: Vec<Message>,
}

pub trait TemplateResolver: Send + Sync {
    fn resolve(
        &self,
        template: ObjectTemplate,
        params: &TemplateParams,
    ) -> Result<ResolvedPrompt, LibrettoError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectTemplateResolver;

impl TemplateResolver for ObjectTemplateResolver {
    fn resolve(
        &self,
        template: ObjectTemplate,
        params: &TemplateParams,
    ) -> Result<ResolvedPrompt, LibrettoError> {
        let messages = template.format_messages(params)?;
        Ok(ResolvedPrompt {
            messages,
            template: template.into_messages(),
        })
    }
}

fn render_message(message: &Message, vars: &TemplateParams) -> Result<Message, LibrettoError> {
    let content = match &message.content {
        MessageContent::Text(text) => {
            MessageContent::Text(PromptTemplate::new(text.as_str()).render(vars)?)
        }
        MessageContent::Parts(parts) => MessageContent::Parts(
            parts
                .iter()
                .map(|part| render_part(part, vars))
                .collect::<Result<Vec<_>, _>>()?,
        ),
    };
    Ok(Message {
        role: message.role,
        content,
        provider_metadata: message.provider_metadata.clone(),
    })
}

fn render_part(part: &ContentPart, vars: &TemplateParams) -> Result<ContentPart, LibrettoError> {
    match part {
        ContentPart::Text { text } => Ok(ContentPart::Text {
            text: PromptTemplate::new(text.as_str()).render(vars)?,
        }),
        other => Ok(other.clone()),
    }
}

fn expand_chat_history(
    message: &Message,
    vars: &TemplateParams,
) -> Result<Vec<Message>, LibrettoError> {
    let slot = PromptTemplate::new(message.content.text());
    let mut expanded = Vec::new();
    for name in slot.placeholders()? {
        match vars.get(&name) {
            Some(value) => expanded.extend(history_messages(&name, value)),
            None => tracing::debug!(placeholder = %name, "chat history parameter not provided"),
        }
    }
    Ok(expanded)
}

fn history_messages(name: &str, value: &Value) -> Vec<Message> {
    let entries = match value {
        Value::Array(items) => items.iter().collect::<Vec<_>>(),
        Value::Object(_) => vec![value],
        other => {
            tracing::warn!(
                placeholder = %name,
                kind = %value_kind(other),
                "chat history parameter is not a message list; skipping"
            );
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .filter_map(
            |entry| match serde_json::from_value::<Message>(entry.clone()) {
                Ok(message) => Some(message),
                Err(err) => {
                    tracing::warn!(
                        placeholder = %name,
                        error = %err,
                        "skipping malformed chat history entry"
                    );
                    None
                }
            },
        )
        .collect()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
