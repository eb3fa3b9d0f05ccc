use std::time::{Duration, Instant};

use libretto_client::{EventRecord, ModelParameters, ModelType, ResponseMetrics};
use libretto_core::{
    CallMode, CallOptions, GenerateResult, LibrettoOptions, Message, ToolDefinition, Value,
};
use secrecy::SecretString;
use serde_json::Map;
use uuid::Uuid;

use crate::{parse_model_id, provider_name};

/// Settings that duplicate the message list and are never logged as model parameters.
pub const RAW_CALL_SETTINGS_REMOVAL_KEYS: [&str; 2] = ["system", "systemInstruction"];

/// What the middleware remembers about a call while the provider is working on it.
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub model_provider: String,
    pub model: String,
    pub model_type: ModelType,
    pub mode: CallMode,
    pub prompt: Vec<Message>,
    pub options: LibrettoOptions,
    started: Instant,
}

impl CallRecord {
    pub fn start(provider: &str, model_id: &str, params: &CallOptions) -> Self {
        Self {
            model_provider: provider_name(provider).to_string(),
            model: parse_model_id(model_id).to_string(),
            model_type: params.input_format.into(),
            mode: params.mode.clone(),
            prompt: params.prompt.clone(),
            options: params.libretto_options().cloned().unwrap_or_default(),
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn redact_pii(&self) -> bool {
        self.options.redact_pii
    }

    pub fn into_event(
        self,
        result: &GenerateResult,
        elapsed: Duration,
        default_api_key: Option<&SecretString>,
        source: &str,
    ) -> EventRecord {
        let LibrettoOptions {
            api_key,
            prompt_template_name,
            template_params,
            template_chat,
            feedback_key,
            chat_id,
            chain_id,
            ..
        } = self.options;

        let settings = result
            .raw_call
            .raw_settings
            .iter()
            .filter(|(key, _)| !RAW_CALL_SETTINGS_REMOVAL_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect::<Map<String, Value>>();

        EventRecord {
            response_time: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            response: result.text.clone(),
            raw_response: result
                .raw_response
                .as_ref()
                .and_then(|raw| raw.body.clone()),
            response_metrics: ResponseMetrics {
                usage: result.usage,
                finish_reason: result.finish_reason,
                logprobs: result.logprobs.clone(),
            },
            params: template_params.unwrap_or_default(),
            api_key: api_key.or_else(|| default_api_key.cloned()),
            prompt_template_chat: template_chat.unwrap_or(self.prompt),
            api_name: prompt_template_name.clone(),
            prompt_template_name,
            prompt: Value::Object(Map::new()),
            chat_id,
            chain_id,
            feedback_key: feedback_key.unwrap_or_else(|| Uuid::new_v4().to_string()),
            model_parameters: ModelParameters::new(
                self.model_provider,
                self.model,
                self.model_type,
                settings,
            ),
            tools: tools_for_mode(&self.mode),
            tool_calls: result.tool_calls.clone(),
            source: source.to_string(),
        }
    }
}

pub fn tools_for_mode(mode: &CallMode) -> Vec<ToolDefinition> {
    match mode {
        CallMode::Regular { tools, .. } => tools.clone(),
        CallMode::ObjectTool { tool } => vec![tool.clone()],
        CallMode::ObjectJson { .. } => {
            tracing::warn!(
                mode = "object-json",
                "object-json generation is not supported by Libretto yet; reporting no tools"
            );
            Vec::new()
        }
    }
}
