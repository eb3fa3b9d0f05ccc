//! Core types shared by the Libretto middleware crates.
//!
//! A generation call is described by [`CallOptions`], answered by a [`LanguageModel`] with a
//! [`GenerateResult`], and carries Libretto-specific settings in [`LibrettoOptions`].
mod error;
mod message;
mod model;
mod options;
mod value;

pub use error::LibrettoError;
pub use message::{ContentPart, Message, MessageContent, Role};
pub use model::{
    CallMode, CallOptions, CallSettings, FinishReason, GenerateResult, InputFormat,
    LanguageModel, LogProb, RawCall, RawResponse, ToolCall, ToolChoice, ToolDefinition,
    TopLogProb, Usage,
};
pub use options::{LibrettoMessageOptions, LibrettoOptions, ProviderMetadata, ProviderOptions};
pub use value::{TemplateParams, Value};
