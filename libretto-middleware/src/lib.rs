//! Libretto middleware for provider-agnostic generation calls.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use libretto_client::LibrettoConfig;
//! use libretto_core::{CallOptions, LanguageModel, LibrettoOptions, Message};
//! use libretto_middleware::{wrap_language_model, LibrettoMiddleware};
//!
//! async fn run(model: Arc<dyn LanguageModel>) -> Result<(), Box<dyn std::error::Error>> {
//!     let middleware = LibrettoMiddleware::new(LibrettoConfig::from_env())?;
//!     let wrapped = wrap_language_model(model, middleware);
//!     let options = CallOptions::messages(vec![Message::user("Hello, my name is {name}")])
//!         .with_libretto_options(
//!             LibrettoOptions::new()
//!                 .prompt_template_name("greeting")
//!                 .template_param("name", "Jamie"),
//!         );
//!     let result = wrapped.do_generate(options).await?;
//!     println!("{:?}", result.text);
//!     Ok(())
//! }
//! ```
mod middleware;
mod model_id;
mod normalize;
mod redact;
mod shaper;
mod wrapped;

pub use middleware::{FlushError, LibrettoMiddleware};
pub use model_id::{parse_model_id, provider_name};
pub use normalize::{modify_prompt_for_chat_history, standardize_chat_history, PromptModification};
pub use redact::redact_pii;
pub use shaper::{tools_for_mode, CallRecord, RAW_CALL_SETTINGS_REMOVAL_KEYS};
pub use wrapped::{wrap_language_model, WrappedModel};
