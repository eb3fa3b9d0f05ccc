//! Minimal OpenAI-compatible chat model used by the demo programs.
//!
//! Works against any provider exposing `/chat/completions` (OpenAI, Groq, Gemini's OpenAI
//! endpoint, ...).

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use libretto::{
    CallMode, CallOptions, CallSettings, ContentPart, FinishReason, GenerateResult,
    LanguageModel, LibrettoError, LogProb, Message, MessageContent, RawCall, RawResponse, Role,
    ToolCall, ToolChoice, ToolDefinition, TopLogProb, Usage,
};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Map, Value};

#[derive(Clone)]
pub struct OpenAiCompatibleModel {
    provider: String,
    model_id: String,
    base_url: String,
    api_key: SecretString,
    http: Client,
}

impl OpenAiCompatibleModel {
    pub fn new(
        provider: impl Into<String>,
        base_url: impl Into<String>,
        model_id: impl Into<String>,
        api_key: SecretString,
    ) -> Result<Self, LibrettoError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|err| LibrettoError::Provider(err.to_string()))?;
        Ok(Self {
            provider: provider.into(),
            model_id: model_id.into(),
            base_url: base_url.into(),
            api_key,
            http,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<ResponseUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
    logprobs: Option<ChoiceLogprobs>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ResponseToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ResponseToolCall {
    id: String,
    function: ResponseFunction,
}

#[derive(Debug, Deserialize)]
struct ResponseFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ResponseUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChoiceLogprobs {
    content: Option<Vec<TokenLogprob>>,
}

#[derive(Debug, Deserialize)]
struct TokenLogprob {
    token: String,
    logprob: f64,
    #[serde(default)]
    top_logprobs: Vec<TopTokenLogprob>,
}

#[derive(Debug, Deserialize)]
struct TopTokenLogprob {
    token: String,
    logprob: f64,
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::ChatHistory => "user",
        other => other.as_str(),
    }
}

fn map_messages(messages: &[Message]) -> Vec<Value> {
    let mut mapped = Vec::with_capacity(messages.len());
    for message in messages {
        let role = role_name(message.role);
        let parts = match &message.content {
            MessageContent::Text(text) => {
                mapped.push(json!({"role": role, "content": text}));
                continue;
            }
            MessageContent::Parts(parts) => parts,
        };

        let mut content = Vec::new();
        let mut tool_calls = Vec::new();
        for part in parts {
            match part {
                ContentPart::Text { text } => content.push(json!({"type": "text", "text": text})),
                ContentPart::Image { image, .. } => {
                    content.push(json!({"type": "image_url", "image_url": {"url": image}}))
                }
                ContentPart::ToolCall {
                    tool_call_id,
                    tool_name,
                    args,
                } => tool_calls.push(json!({
                    "id": tool_call_id,
                    "type": "function",
                    "function": {"name": tool_name, "arguments": args.to_string()}
                })),
                ContentPart::ToolResult {
                    tool_call_id,
                    result,
                    ..
                } => mapped.push(json!({
                    "role": "tool",
                    "tool_call_id": tool_call_id,
                    "content": result.to_string()
                })),
            }
        }

        if content.is_empty() && tool_calls.is_empty() {
            continue;
        }
        let mut entry = Map::new();
        entry.insert("role".to_string(), json!(role));
        entry.insert(
            "content".to_string(),
            if content.is_empty() {
                Value::Null
            } else {
                Value::Array(content)
            },
        );
        if !tool_calls.is_empty() {
            entry.insert("tool_calls".to_string(), Value::Array(tool_calls));
        }
        mapped.push(Value::Object(entry));
    }
    mapped
}

fn map_settings(settings: &CallSettings) -> Map<String, Value> {
    let mut raw = Map::new();
    if let Some(value) = settings.temperature {
        raw.insert("temperature".to_string(), json!(value));
    }
    if let Some(value) = settings.max_tokens {
        raw.insert("max_tokens".to_string(), json!(value));
    }
    if let Some(value) = settings.top_p {
        raw.insert("top_p".to_string(), json!(value));
    }
    if let Some(value) = settings.presence_penalty {
        raw.insert("presence_penalty".to_string(), json!(value));
    }
    if let Some(value) = settings.frequency_penalty {
        raw.insert("frequency_penalty".to_string(), json!(value));
    }
    if let Some(value) = &settings.stop_sequences {
        raw.insert("stop".to_string(), json!(value));
    }
    if let Some(value) = settings.seed {
        raw.insert("seed".to_string(), json!(value));
    }
    for (key, value) in &settings.extra {
        raw.insert(key.clone(), value.clone());
    }
    raw
}

fn map_tool(tool: &ToolDefinition) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters
        }
    })
}

fn map_tool_choice(choice: &ToolChoice) -> Value {
    match choice {
        ToolChoice::Auto => json!("auto"),
        ToolChoice::None => json!("none"),
        ToolChoice::Required => json!("required"),
        ToolChoice::Tool { tool_name } => {
            json!({"type": "function", "function": {"name": tool_name}})
        }
    }
}

fn apply_mode(body: &mut Map<String, Value>, mode: &CallMode) {
    match mode {
        CallMode::Regular { tools, tool_choice } => {
            if !tools.is_empty() {
                body.insert(
                    "tools".to_string(),
                    Value::Array(tools.iter().map(map_tool).collect()),
                );
            }
            if let Some(choice) = tool_choice {
                body.insert("tool_choice".to_string(), map_tool_choice(choice));
            }
        }
        CallMode::ObjectTool { tool } => {
            body.insert("tools".to_string(), json!([map_tool(tool)]));
            body.insert(
                "tool_choice".to_string(),
                json!({"type": "function", "function": {"name": tool.name}}),
            );
        }
        CallMode::ObjectJson { schema, name, .. } => {
            let format = match schema {
                Some(schema) => json!({
                    "type": "json_schema",
                    "json_schema": {"name": name.as_deref().unwrap_or("response"), "schema": schema}
                }),
                None => json!({"type": "json_object"}),
            };
            body.insert("response_format".to_string(), format);
        }
    }
}

fn map_logprobs(logprobs: Option<ChoiceLogprobs>) -> Option<Vec<LogProb>> {
    logprobs.and_then(|logprobs| logprobs.content).map(|tokens| {
        tokens
            .into_iter()
            .map(|token| LogProb {
                token: token.token,
                logprob: token.logprob,
                top_logprobs: token
                    .top_logprobs
                    .into_iter()
                    .map(|top| TopLogProb {
                        token: top.token,
                        logprob: top.logprob,
                    })
                    .collect(),
            })
            .collect()
    })
}

#[async_trait]
impl LanguageModel for OpenAiCompatibleModel {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn do_generate(&self, options: CallOptions) -> Result<GenerateResult, LibrettoError> {
        let raw_prompt = Value::Array(map_messages(&options.prompt));
        let raw_settings = map_settings(&options.settings);

        let mut body = raw_settings.clone();
        body.insert("model".to_string(), json!(self.model_id));
        body.insert("messages".to_string(), raw_prompt.clone());
        apply_mode(&mut body, &options.mode);

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|err| LibrettoError::Provider(err.to_string()))?
            .error_for_status()
            .map_err(|err| LibrettoError::Provider(err.to_string()))?;

        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect::<BTreeMap<_, _>>();
        let raw_body: Value = response
            .json()
            .await
            .map_err(|err| LibrettoError::Provider(err.to_string()))?;
        let parsed: ChatCompletionResponse = serde_json::from_value(raw_body.clone())?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LibrettoError::Provider("no choices returned".to_string()))?;
        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCall {
                tool_call_id: call.id,
                tool_name: call.function.name,
                args: call.function.arguments,
            })
            .collect();

        Ok(GenerateResult {
            text: choice.message.content,
            tool_calls,
            finish_reason: FinishReason::from_provider(choice.finish_reason.as_deref()),
            usage: parsed
                .usage
                .map(|usage| Usage {
                    prompt_tokens: usage.prompt_tokens,
                    completion_tokens: usage.completion_tokens,
                })
                .unwrap_or_default(),
            logprobs: map_logprobs(choice.logprobs),
            raw_call: RawCall {
                raw_prompt,
                raw_settings,
            },
            raw_response: Some(RawResponse {
                headers: Some(headers),
                body: Some(raw_body),
            }),
        })
    }
}
