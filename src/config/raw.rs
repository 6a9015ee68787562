use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde_with::serde_as;
use url::Url;

use crate::Result;
use crate::error::ConfigError;

use super::defaults::{
    default_connect_timeout, default_ip, default_max_attempts, default_max_connections,
    default_max_message_bytes, default_port, default_read_timeout, default_request_timeout,
    default_title,
};
use super::env::{self, Lookup};
use super::{
    Config, HumantimeDuration, ListenerSettings, MAX_ATTEMPTS_BOUNDS, MAX_MESSAGE_BYTES_BOUNDS,
    WebhookSettings,
};

const ENV_PREFIX: &str = "ALERT_RELAY";

pub(super) fn load(path: impl AsRef<Path>) -> std::result::Result<RawConfig, ConfigError> {
    ::config::Config::builder()
        .add_source(::config::File::from(path.as_ref()).required(false))
        .add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|err| ConfigError::Other(err.to_string()))?
        .try_deserialize()
        .map_err(|err| ConfigError::Parse(err.to_string()))
}

#[cfg(test)]
pub(super) fn parse(toml: &str) -> std::result::Result<RawConfig, ConfigError> {
    ::config::Config::builder()
        .add_source(::config::File::from_str(toml, ::config::FileFormat::Toml))
        .build()
        .map_err(|err| ConfigError::Other(err.to_string()))?
        .try_deserialize()
        .map_err(|err| ConfigError::Parse(err.to_string()))
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub(super) listener: RawListener,
    #[serde(default)]
    pub(super) webhook: RawWebhook,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub(super) struct RawListener {
    #[serde(default = "default_ip")]
    pub(super) ip: String,
    #[serde(default = "default_port")]
    pub(super) port: u16,
    #[serde(default = "default_max_message_bytes")]
    pub(super) max_message_bytes: usize,
    #[serde(default = "default_read_timeout")]
    #[serde_as(as = "HumantimeDuration")]
    pub(super) read_timeout: Duration,
    #[serde(default = "default_max_connections")]
    pub(super) max_connections: usize,
}

#[serde_as]
#[derive(Debug, Deserialize)]
pub(super) struct RawWebhook {
    pub(super) url: Option<String>,
    pub(super) secret: Option<String>,
    #[serde(default = "default_title")]
    pub(super) title: String,
    #[serde(default = "default_request_timeout")]
    #[serde_as(as = "HumantimeDuration")]
    pub(super) request_timeout: Duration,
    #[serde(default = "default_connect_timeout")]
    #[serde_as(as = "HumantimeDuration")]
    pub(super) connect_timeout: Duration,
    #[serde(default = "default_max_attempts")]
    pub(super) max_attempts: usize,
}

impl RawConfig {
    pub(super) fn apply_env_overrides(&mut self) -> std::result::Result<(), ConfigError> {
        self.apply_overrides(&env::process_env)
    }

    /// Flat variable names kept from the single-script deployment of the relay.
    pub(super) fn apply_overrides(
        &mut self,
        lookup: Lookup<'_>,
    ) -> std::result::Result<(), ConfigError> {
        if let Some(ip) = env::string(lookup, "SYSLOG_SERVER_IP")? {
            self.listener.ip = ip;
        }
        if let Some(port) = env::parsed::<u16>(lookup, "SYSLOG_SERVER_PORT")? {
            self.listener.port = port;
        }
        if let Some(bytes) = env::parsed::<usize>(lookup, "MAX_MESSAGE_BYTES")? {
            self.listener.max_message_bytes = bytes;
        }
        if let Some(timeout) = env::duration(lookup, "READ_TIMEOUT")? {
            self.listener.read_timeout = timeout;
        }
        if let Some(max) = env::parsed::<usize>(lookup, "MAX_CONNECTIONS")? {
            self.listener.max_connections = max;
        }
        if let Some(url) = env::string(lookup, "WEBHOOK_URL")? {
            self.webhook.url = Some(url);
        }
        if let Some(secret) = env::string(lookup, "WEBHOOK_SECRET")? {
            self.webhook.secret = Some(secret);
        }
        if let Some(title) = env::string(lookup, "WEBHOOK_TITLE")? {
            self.webhook.title = title;
        }
        if let Some(timeout) = env::duration(lookup, "REQUEST_TIMEOUT")? {
            self.webhook.request_timeout = timeout;
        }
        if let Some(attempts) = env::parsed::<usize>(lookup, "WEBHOOK_MAX_ATTEMPTS")? {
            self.webhook.max_attempts = attempts;
        }
        Ok(())
    }

    pub(super) fn validate_and_build(self) -> Result<Config> {
        let ip: IpAddr = self
            .listener
            .ip
            .parse()
            .map_err(|err: std::net::AddrParseError| ConfigError::InvalidField {
                field: "listener.ip",
                message: err.to_string(),
            })?;
        if !MAX_MESSAGE_BYTES_BOUNDS.contains(&self.listener.max_message_bytes) {
            return Err(out_of_range(
                "listener.max_message_bytes",
                &MAX_MESSAGE_BYTES_BOUNDS,
                self.listener.max_message_bytes,
            )
            .into());
        }
        if self.listener.read_timeout.is_zero() {
            return Err(ConfigError::InvalidField {
                field: "listener.read_timeout",
                message: "read timeout must be greater than zero".to_string(),
            }
            .into());
        }
        if self.listener.max_connections == 0 {
            return Err(ConfigError::InvalidField {
                field: "listener.max_connections",
                message: "at least one connection must be allowed".to_string(),
            }
            .into());
        }

        let url_str = self.webhook.url.ok_or(ConfigError::MissingField {
            field: "webhook.url",
        })?;
        let url = Url::parse(&url_str).map_err(|err| ConfigError::InvalidField {
            field: "webhook.url",
            message: err.to_string(),
        })?;
        let secret = self.webhook.secret.ok_or(ConfigError::MissingField {
            field: "webhook.secret",
        })?;
        if secret.trim().is_empty() {
            return Err(ConfigError::InvalidField {
                field: "webhook.secret",
                message: "secret cannot be empty".to_string(),
            }
            .into());
        }
        if self.webhook.request_timeout.is_zero() {
            return Err(ConfigError::InvalidField {
                field: "webhook.request_timeout",
                message: "request timeout must be greater than zero".to_string(),
            }
            .into());
        }
        if self.webhook.connect_timeout.is_zero() {
            return Err(ConfigError::InvalidField {
                field: "webhook.connect_timeout",
                message: "connect timeout must be greater than zero".to_string(),
            }
            .into());
        }
        if !MAX_ATTEMPTS_BOUNDS.contains(&self.webhook.max_attempts) {
            return Err(out_of_range(
                "webhook.max_attempts",
                &MAX_ATTEMPTS_BOUNDS,
                self.webhook.max_attempts,
            )
            .into());
        }

        Ok(Config {
            listener: ListenerSettings {
                addr: SocketAddr::new(ip, self.listener.port),
                max_message_bytes: self.listener.max_message_bytes,
                read_timeout: self.listener.read_timeout,
                max_connections: self.listener.max_connections,
            },
            webhook: WebhookSettings {
                url,
                secret: secret.into(),
                title: self.webhook.title,
                request_timeout: self.webhook.request_timeout,
                connect_timeout: self.webhook.connect_timeout,
                max_attempts: self.webhook.max_attempts,
            },
        })
    }
}

fn out_of_range(
    field: &'static str,
    bounds: &std::ops::RangeInclusive<usize>,
    got: usize,
) -> ConfigError {
    ConfigError::InvalidField {
        field,
        message: format!(
            "expected between {} and {}, got {got}",
            bounds.start(),
            bounds.end()
        ),
    }
}

impl Default for RawListener {
    fn default() -> Self {
        Self {
            ip: default_ip(),
            port: default_port(),
            max_message_bytes: default_max_message_bytes(),
            read_timeout: default_read_timeout(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for RawWebhook {
    fn default() -> Self {
        Self {
            url: None,
            secret: None,
            title: default_title(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            max_attempts: default_max_attempts(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RawConfig;
    use crate::error::ConfigError;
    use std::collections::HashMap;
    use std::time::Duration;

    fn overrides(
        raw: &mut RawConfig,
        vars: &[(&'static str, &str)],
    ) -> Result<(), ConfigError> {
        let vars: HashMap<&str, String> = vars.iter().map(|(k, v)| (*k, v.to_string())).collect();
        raw.apply_overrides(&|key| Ok(vars.get(key).cloned()))
    }

    #[test]
    fn legacy_variables_override_file_values() {
        let mut raw = RawConfig::default();
        overrides(
            &mut raw,
            &[
                ("SYSLOG_SERVER_IP", "127.0.0.1"),
                ("SYSLOG_SERVER_PORT", "6514"),
                ("WEBHOOK_URL", "https://oapi.dingtalk.com/robot/send?access_token=t"),
                ("WEBHOOK_SECRET", "SECxyz"),
                ("REQUEST_TIMEOUT", "2s"),
            ],
        )
        .unwrap();

        let config = raw.validate_and_build().unwrap();
        assert_eq!(config.listener.addr.to_string(), "127.0.0.1:6514");
        assert_eq!(config.webhook.url.host_str(), Some("oapi.dingtalk.com"));
        assert_eq!(config.webhook.request_timeout, Duration::from_secs(2));
    }

    #[test]
    fn blank_variables_are_ignored() {
        let mut raw = RawConfig::default();
        overrides(&mut raw, &[("SYSLOG_SERVER_PORT", "  ")]).unwrap();
        assert_eq!(raw.listener.port, 514);
    }

    #[test]
    fn malformed_port_names_the_variable() {
        let mut raw = RawConfig::default();
        let err = overrides(&mut raw, &[("SYSLOG_SERVER_PORT", "syslog")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidField {
                field: "SYSLOG_SERVER_PORT",
                ..
            }
        ));
    }
}
