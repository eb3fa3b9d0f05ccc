//! Prompt templates with `{name}` placeholders and chat-history expansion.
mod object;
mod template;

pub use object::{ObjectTemplate, ObjectTemplateResolver, ResolvedPrompt, TemplateResolver};
pub use template::PromptTemplate;
