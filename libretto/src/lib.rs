//! Libretto prompt templating and telemetry for LLM generation calls.
//!
//! Wrap any [`LanguageModel`] with [`wrap_language_model`] to resolve `{name}` placeholders
//! and chat-history slots before the call and report each finished call to Libretto.
pub use libretto_client::{
    EventRecord, EventSink, LibrettoClient, LibrettoClientError, LibrettoConfig,
    ModelParameters, ModelType, ResponseMetrics,
};
pub use libretto_core::*;
pub use libretto_middleware::{
    modify_prompt_for_chat_history, parse_model_id, standardize_chat_history,
    wrap_language_model, FlushError, LibrettoMiddleware, WrappedModel,
};
pub use libretto_prompt::{
    ObjectTemplate, ObjectTemplateResolver, PromptTemplate, ResolvedPrompt, TemplateResolver,
};

pub mod prelude {
    pub use libretto_client::LibrettoConfig;
    pub use libretto_core::{
        CallOptions, CallSettings, ContentPart, LanguageModel, LibrettoOptions, Message, Role,
    };
    pub use libretto_middleware::{wrap_language_model, LibrettoMiddleware};
}
