use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use libretto_client::{
    EventRecord, EventSink, LibrettoClient, LibrettoClientError, LibrettoConfig, DEFAULT_SOURCE,
};
use libretto_core::{CallOptions, GenerateResult, LanguageModel, LibrettoError};
use libretto_prompt::{ObjectTemplate, ObjectTemplateResolver, TemplateResolver};
use secrecy::SecretString;
use thiserror::Error;
use tokio::task::JoinSet;

use crate::{
    modify_prompt_for_chat_history, redact_pii, standardize_chat_history, CallRecord,
    PromptModification,
};

#[derive(Debug, Error)]
pub enum FlushError {
    #[error("timed out after {waited:?} with {pending} uploads still running")]
    Timeout { waited: Duration, pending: usize },
}

/// Resolves prompt templates before a call and reports the finished call to Libretto.
#[derive(Clone)]
pub struct LibrettoMiddleware {
    resolver: Arc<dyn TemplateResolver>,
    sink: Arc<dyn EventSink>,
    default_api_key: Option<SecretString>,
    source: String,
    pending: Arc<Mutex<JoinSet<()>>>,
}

impl fmt::Debug for LibrettoMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.default_api_key.is_some() {
            "<redacted>"
        } else {
            "<none>"
        };

        f.debug_struct("LibrettoMiddleware")
            .field("default_api_key", &api_key)
            .field("source", &self.source)
            .field("pending_uploads", &self.pending_uploads())
            .finish()
    }
}

impl LibrettoMiddleware {
    /// Builds a middleware that uploads events with a [`LibrettoClient`].
    pub fn new(config: LibrettoConfig) -> Result<Self, LibrettoClientError> {
        let client = LibrettoClient::new(&config)?;
        Ok(Self {
            resolver: Arc::new(ObjectTemplateResolver),
            sink: Arc::new(client),
            default_api_key: config.api_key,
            source: config.source,
            pending: Arc::default(),
        })
    }

    pub fn with_sink(sink: Arc<dyn EventSink>) -> Self {
        Self {
            resolver: Arc::new(ObjectTemplateResolver),
            sink,
            default_api_key: None,
            source: DEFAULT_SOURCE.to_string(),
            pending: Arc::default(),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn TemplateResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_default_api_key(mut self, key: SecretString) -> Self {
        self.default_api_key = Some(key);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Rewrites the prompt into its resolved form and records the template it came from.
    pub fn transform_params(
        &self,
        mut params: CallOptions,
    ) -> Result<CallOptions, LibrettoError> {
        let PromptModification {
            modified_prompt,
            has_chat_history,
        } = modify_prompt_for_chat_history(std::mem::take(&mut params.prompt));

        let options = params.libretto_options_mut();
        let template_params = options.template_params.clone().unwrap_or_default();
        let resolved = self
            .resolver
            .resolve(ObjectTemplate::new(modified_prompt), &template_params)?;

        if options.template_chat.is_none() && !resolved.template.is_empty() {
            options.template_chat = Some(resolved.template);
        }

        params.prompt = if has_chat_history {
            standardize_chat_history(resolved.messages)
        } else {
            resolved.messages
        };
        Ok(params)
    }

    /// Runs the provider call and dispatches its event without waiting on the upload.
    ///
    /// Provider errors are returned as-is and produce no event.
    pub async fn wrap_generate<M>(
        &self,
        model: &M,
        params: CallOptions,
    ) -> Result<GenerateResult, LibrettoError>
    where
        M: LanguageModel + ?Sized,
    {
        let record = CallRecord::start(model.provider(), model.model_id(), &params);

        let result = model.do_generate(params).await?;
        let elapsed = record.elapsed();

        let redact = record.redact_pii();
        let mut event = record.into_event(
            &result,
            elapsed,
            self.default_api_key.as_ref(),
            &self.source,
        );
        if redact {
            event = redact_pii(event);
        }
        self.dispatch(event);

        Ok(result)
    }

    /// Hands the event to the sink on a background task tracked for [`Self::flush`].
    /// Upload failures are logged only.
    fn dispatch(&self, event: EventRecord) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(err) => {
                tracing::error!(
                    error = %err,
                    feedback_key = %event.feedback_key,
                    "no Tokio runtime available; dropping Libretto event"
                );
                return;
            }
        };

        let sink = Arc::clone(&self.sink);
        let upload = async move {
            let feedback_key = event.feedback_key.clone();
            if let Err(err) = sink.send(event).await {
                tracing::error!(
                    error = %err,
                    feedback_key = %feedback_key,
                    "error sending event to Libretto"
                );
            }
        };

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        while pending.try_join_next().is_some() {}
        pending.spawn_on(upload, &handle);
    }

    /// Number of dispatched uploads that have not completed yet.
    pub fn pending_uploads(&self) -> usize {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        while pending.try_join_next().is_some() {}
        pending.len()
    }

    /// Waits for every upload dispatched so far, shared across clones of this middleware.
    ///
    /// Returns how many outstanding uploads were awaited. On timeout the remaining uploads keep running
    /// detached.
    pub async fn flush(&self, timeout: Duration) -> Result<usize, FlushError> {
        let mut pending = std::mem::take(
            &mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner),
        );
        let deadline = tokio::time::Instant::now() + timeout;
        let mut flushed = 0;
        loop {
            match tokio::time::timeout_at(deadline, pending.join_next()).await {
                Ok(Some(_)) => flushed += 1,
                Ok(None) => return Ok(flushed),
                Err(_) => {
                    let still_running = pending.len();
                    pending.detach_all();
                    return Err(FlushError::Timeout {
                        waited: timeout,
                        pending: still_running,
                    });
                }
            }
        }
    }
}
