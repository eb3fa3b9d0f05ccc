use std::collections::BTreeMap;

pub type Value = serde_json::Value;

/// Placeholder name to substitution value. A value may be plain text or a list of messages
/// injected through a chat-history placeholder.
pub type TemplateParams = BTreeMap<String, Value>;
