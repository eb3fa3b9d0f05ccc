use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Map;

use crate::{LibrettoError, Message, TemplateParams, Value};

/// Per-message metadata bag. Only the Libretto namespace is typed; other providers' entries
/// are carried through untouched.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ProviderMetadata {
    #[serde(
        rename = "librettoOptions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub libretto: Option<LibrettoMessageOptions>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl ProviderMetadata {
    pub fn chat_history() -> Self {
        Self {
            libretto: Some(LibrettoMessageOptions {
                is_chat_history: true,
            }),
            other: Map::new(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LibrettoMessageOptions {
    #[serde(default)]
    pub is_chat_history: bool,
}

/// Call-level provider options keyed by namespace.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ProviderOptions {
    #[serde(
        rename = "librettoOptions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub libretto: Option<LibrettoOptions>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl ProviderOptions {
    /// Parses an untyped options object, rejecting unknown keys in the Libretto namespace.
    pub fn from_value(value: Value) -> Result<Self, LibrettoError> {
        serde_json::from_value(value).map_err(|err| LibrettoError::InvalidOptions(err.to_string()))
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LibrettoOptions {
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_params: Option<TemplateParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_chat: Option<Vec<Message>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub redact_pii: bool,
}

impl LibrettoOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_key(mut self, value: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::new(value.into()));
        self
    }

    pub fn prompt_template_name(mut self, value: impl Into<String>) -> Self {
        self.prompt_template_name = Some(value.into());
        self
    }

    pub fn template_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.template_params
            .get_or_insert_with(TemplateParams::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn template_params(mut self, params: TemplateParams) -> Self {
        self.template_params = Some(params);
        self
    }

    pub fn template_chat(mut self, template: Vec<Message>) -> Self {
        self.template_chat = Some(template);
        self
    }

    pub fn feedback_key(mut self, value: impl Into<String>) -> Self {
        self.feedback_key = Some(value.into());
        self
    }

    pub fn chat_id(mut self, value: impl Into<String>) -> Self {
        self.chat_id = Some(value.into());
        self
    }

    pub fn chain_id(mut self, value: impl Into<String>) -> Self {
        self.chain_id = Some(value.into());
        self
    }

    pub fn redact_pii(mut self, value: bool) -> Self {
        self.redact_pii = value;
        self
    }
}
