use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::Result;
use crate::error::Error as RelayError;

mod defaults;
mod env;
mod raw;
mod serde;

pub(crate) use self::serde::HumantimeDuration;

const MAX_ATTEMPTS_BOUNDS: RangeInclusive<usize> = 1..=10;
const MAX_MESSAGE_BYTES_BOUNDS: RangeInclusive<usize> = 1..=1024 * 1024;

/// Process-wide settings, built once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct Config {
    pub listener: ListenerSettings,
    pub webhook: WebhookSettings,
}

#[derive(Debug, Clone)]
pub struct ListenerSettings {
    pub addr: SocketAddr,
    /// Upper bound on bytes read from one connection; the rest is discarded.
    pub max_message_bytes: usize,
    pub read_timeout: Duration,
    pub max_connections: usize,
}

#[derive(Debug, Clone)]
pub struct WebhookSettings {
    pub url: Url,
    pub secret: SecretString,
    pub title: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// 1 keeps best-effort delivery; higher values retry transient failures.
    pub max_attempts: usize,
}

impl Config {
    /// Load configuration from an optional TOML file and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be parsed, when an environment
    /// override is malformed, or when the merged values fail validation.
    pub fn from_env_and_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut raw = raw::load(path).map_err(RelayError::from)?;
        raw.apply_env_overrides().map_err(RelayError::from)?;
        raw.validate_and_build()
    }
}
