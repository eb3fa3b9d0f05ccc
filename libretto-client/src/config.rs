use std::time::Duration;

use secrecy::SecretString;

pub const DEFAULT_API_URL: &str = "https://app.getlibretto.com/api";
pub const DEFAULT_SOURCE: &str = "libretto-rs";
pub const API_KEY_ENV: &str = "LIBRETTO_API_KEY";
pub const API_PREFIX_ENV: &str = "LIBRETTO_API_PREFIX";

#[derive(Clone, Debug)]
pub struct LibrettoConfig {
    /// Fallback key used when a call does not carry its own.
    pub api_key: Option<SecretString>,
    pub api_url: String,
    pub timeout: Duration,
    /// Reported as the event's `source`.
    pub source: String,
}

impl Default for LibrettoConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(30),
            source: DEFAULT_SOURCE.to_string(),
        }
    }
}

impl LibrettoConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `LIBRETTO_API_KEY` and `LIBRETTO_API_PREFIX` from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(key) = lookup(API_KEY_ENV) {
            config = config.with_api_key(key);
        }
        if let Some(url) = lookup(API_PREFIX_ENV).filter(|url| !url.trim().is_empty()) {
            config = config.with_api_url(url.trim());
        }
        config
    }

    pub fn with_api_key(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        let trimmed = value.trim();
        self.api_key = if trimmed.is_empty() {
            None
        } else {
            Some(SecretString::new(trimmed.to_string()))
        };
        self
    }

    pub fn with_api_url(mut self, value: impl Into<String>) -> Self {
        self.api_url = value.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_source(mut self, value: impl Into<String>) -> Self {
        self.source = value.into();
        self
    }
}
