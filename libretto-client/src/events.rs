use libretto_core::{
    FinishReason, InputFormat, LogProb, Message, TemplateParams, ToolCall, ToolDefinition, Usage,
    Value,
};
use secrecy::SecretString;
use serde::Serialize;
use serde_json::Map;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    Chat,
    Completion,
}

impl From<InputFormat> for ModelType {
    fn from(format: InputFormat) -> Self {
        match format {
            InputFormat::Messages => ModelType::Chat,
            InputFormat::Prompt => ModelType::Completion,
        }
    }
}

/// Provider settings plus the three fields the Libretto backend requires.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelParameters {
    pub model_provider: String,
    pub model: String,
    pub model_type: ModelType,
    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

impl ModelParameters {
    /// Settings keys that collide with the required fields are dropped in their favour.
    pub fn new(
        model_provider: impl Into<String>,
        model: impl Into<String>,
        model_type: ModelType,
        mut settings: Map<String, Value>,
    ) -> Self {
        for key in ["modelProvider", "model", "modelType"] {
            settings.remove(key);
        }
        Self {
            model_provider: model_provider.into(),
            model: model.into(),
            model_type,
            settings,
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ResponseMetrics {
    pub usage: Usage,
    pub finish_reason: FinishReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<Vec<LogProb>>,
}

/// One generation call as reported to Libretto.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Wall-clock milliseconds spent in the provider call.
    pub response_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<Value>,
    pub response_metrics: ResponseMetrics,
    pub params: TemplateParams,
    #[serde(skip)]
    pub api_key: Option<SecretString>,
    pub prompt_template_chat: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_template_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_name: Option<String>,
    pub prompt: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    pub feedback_key: String,
    pub model_parameters: ModelParameters,
    pub tools: Vec<ToolDefinition>,
    pub tool_calls: Vec<ToolCall>,
    pub source: String,
}
