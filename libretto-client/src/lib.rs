//! Upload of Libretto event records.
//!
//! ```rust,no_run
//! use libretto_client::{LibrettoClient, LibrettoConfig};
//!
//! # fn main() -> Result<(), libretto_client::LibrettoClientError> {
//! let config = LibrettoConfig::new().with_api_key("lib-key");
//! let client = LibrettoClient::new(&config)?;
//! # let _ = client;
//! # Ok(())
//! # }
//! ```
mod client;
mod config;
mod events;
mod sink;

pub use client::{LibrettoClient, LibrettoClientError};
pub use config::{LibrettoConfig, API_KEY_ENV, API_PREFIX_ENV, DEFAULT_API_URL, DEFAULT_SOURCE};
pub use events::{EventRecord, ModelParameters, ModelType, ResponseMetrics};
pub use sink::EventSink;
