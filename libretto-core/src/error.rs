use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibrettoError {
    #[error("LLM provider failed: {0}")]
    Provider(String),
    #[error("Invalid Libretto options: {0}")]
    InvalidOptions(String),
    #[error("Template resolution failed: {0}")]
    Template(String),
    #[error("Serialization/deserialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
