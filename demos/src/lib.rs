//! Shared setup for the Libretto demo programs.

mod openai;

pub use openai::OpenAiCompatibleModel;

use std::time::Duration;

use libretto::{LanguageModel, LibrettoMiddleware, WrappedModel};
use secrecy::SecretString;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// A provider endpoint speaking the OpenAI chat-completions protocol.
#[derive(Clone, Copy, Debug)]
pub struct Target {
    pub provider: &'static str,
    pub base_url: &'static str,
    pub model_id: &'static str,
    pub key_env: &'static str,
}

pub const TARGETS: &[Target] = &[
    Target {
        provider: "openai.chat",
        base_url: "https://api.openai.com/v1",
        model_id: "gpt-4o-mini",
        key_env: "OPENAI_API_KEY",
    },
    Target {
        provider: "groq.chat",
        base_url: "https://api.groq.com/openai/v1",
        model_id: "llama-3.3-70b-versatile",
        key_env: "GROQ_API_KEY",
    },
    Target {
        provider: "google.generative-ai",
        base_url: "https://generativelanguage.googleapis.com/v1beta/openai",
        model_id: "models/gemini-2.0-flash",
        key_env: "GEMINI_API_KEY",
    },
];

pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,libretto_middleware=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// How long a demo waits for outstanding event uploads before exiting.
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds a wrapped model for every target whose API key is present in the environment.
///
/// All models share `middleware`, so one [`LibrettoMiddleware::flush`] covers every upload.
pub fn configured_models(
    middleware: &LibrettoMiddleware,
) -> anyhow::Result<Vec<WrappedModel<OpenAiCompatibleModel>>> {
    let mut models = Vec::new();
    for target in TARGETS {
        let Some(key) = std::env::var(target.key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
        else {
            tracing::info!(
                provider = target.provider,
                env = target.key_env,
                "skipping provider without API key"
            );
            continue;
        };
        let model = OpenAiCompatibleModel::new(
            target.provider,
            target.base_url,
            target.model_id,
            SecretString::new(key),
        )?;
        models.push(libretto::wrap_language_model(model, middleware.clone()));
    }
    if models.is_empty() {
        let names: Vec<_> = TARGETS.iter().map(|target| target.key_env).collect();
        anyhow::bail!("no provider API keys set; export one of {}", names.join(", "));
    }
    Ok(models)
}

/// Waits for outstanding uploads; anything still running at the deadline is reported.
pub async fn flush_events(middleware: &LibrettoMiddleware) {
    match middleware.flush(FLUSH_TIMEOUT).await {
        Ok(flushed) => tracing::debug!(flushed, "Libretto events flushed"),
        Err(err) => tracing::warn!(error = %err, "Libretto events not flushed before exit"),
    }
}

/// Label used when printing a model's answer.
pub fn label(model: &impl LanguageModel) -> String {
    format!("{}:{}", model.provider(), model.model_id())
}
