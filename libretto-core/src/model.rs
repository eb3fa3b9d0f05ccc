use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Map;

use crate::{LibrettoError, LibrettoOptions, Message, ProviderOptions, Value};

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Messages,
    Prompt,
}

/// Function tool exposed to the model.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename = "function")]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            parameters,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolChoice {
    Auto,
    None,
    Required,
    Tool {
        #[serde(rename = "toolName")]
        tool_name: String,
    },
}

/// How the caller wants the model to answer.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CallMode {
    Regular {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tools: Vec<ToolDefinition>,
        #[serde(
            default,
            rename = "toolChoice",
            skip_serializing_if = "Option::is_none"
        )]
        tool_choice: Option<ToolChoice>,
    },
    ObjectTool {
        tool: ToolDefinition,
    },
    ObjectJson {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        schema: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl Default for CallMode {
    fn default() -> Self {
        CallMode::Regular {
            tools: Vec::new(),
            tool_choice: None,
        }
    }
}

impl CallMode {
    pub fn regular(tools: Vec<ToolDefinition>) -> Self {
        CallMode::Regular {
            tools,
            tool_choice: None,
        }
    }
}

/// Common sampling settings plus free-form provider-specific entries.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Descriptor of a single generation call as it flows through the middleware.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallOptions {
    pub input_format: InputFormat,
    #[serde(default)]
    pub mode: CallMode,
    pub prompt: Vec<Message>,
    #[serde(default)]
    pub settings: CallSettings,
    #[serde(default)]
    pub provider_options: ProviderOptions,
}

impl CallOptions {
    pub fn messages(prompt: Vec<Message>) -> Self {
        Self {
            input_format: InputFormat::Messages,
            mode: CallMode::default(),
            prompt,
            settings: CallSettings::default(),
            provider_options: ProviderOptions::default(),
        }
    }

    pub fn with_mode(mut self, mode: CallMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_settings(mut self, settings: CallSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_libretto_options(mut self, options: LibrettoOptions) -> Self {
        self.provider_options.libretto = Some(options);
        self
    }

    pub fn libretto_options(&self) -> Option<&LibrettoOptions> {
        self.provider_options.libretto.as_ref()
    }

    pub fn libretto_options_mut(&mut self) -> &mut LibrettoOptions {
        self.provider_options
            .libretto
            .get_or_insert_with(LibrettoOptions::default)
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl Usage {
    pub fn total_tokens(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    ToolCalls,
    Error,
    Other,
    #[default]
    Unknown,
}

impl FinishReason {
    /// Maps OpenAI-style finish reasons onto the provider-agnostic set.
    pub fn from_provider(reason: Option<&str>) -> Self {
        match reason {
            Some("stop") | Some("end_turn") | Some("STOP") => FinishReason::Stop,
            Some("length") | Some("max_tokens") | Some("MAX_TOKENS") => FinishReason::Length,
            Some("content_filter") | Some("SAFETY") => FinishReason::ContentFilter,
            Some("tool_calls") | Some("function_call") | Some("tool_use") => {
                FinishReason::ToolCalls
            }
            Some(_) => FinishReason::Other,
            None => FinishReason::Unknown,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopLogProb {
    pub token: String,
    pub logprob: f64,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogProb {
    pub token: String,
    pub logprob: f64,
    #[serde(default)]
    pub top_logprobs: Vec<TopLogProb>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "toolCallType", rename = "function", rename_all = "camelCase")]
pub struct ToolCall {
    pub tool_call_id: String,
    pub tool_name: String,
    /// JSON-encoded arguments exactly as the provider returned them.
    pub args: String,
}

/// What was actually sent to the provider.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawCall {
    pub raw_prompt: Value,
    pub raw_settings: Map<String, Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct RawResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<Vec<LogProb>>,
    #[serde(default)]
    pub raw_call: RawCall,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<RawResponse>,
}

/// A concrete provider model. `provider` may carry a driver suffix such as `openai.chat`.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn provider(&self) -> &str;

    fn model_id(&self) -> &str;

    async fn do_generate(&self, options: CallOptions) -> Result<GenerateResult, LibrettoError>;
}

#[async_trait]
impl<T> LanguageModel for Arc<T>
where
    T: LanguageModel + ?Sized,
{
    fn provider(&self) -> &str {
        (**self).provider()
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }

    async fn do_generate(&self, options: CallOptions) -> Result<GenerateResult, LibrettoError> {
        (**self).do_generate(options).await
    }
}
