use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{ArgAction, Parser};

#[derive(Parser, Debug)]
#[command(author, version, about = "Relays syslog alarm messages to a chat webhook", long_about = None)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Listen address, overriding `listener.ip` and `listener.port` (e.g. "0.0.0.0:514").
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<SocketAddr>,

    /// Allow a plain-HTTP webhook URL.
    #[arg(long, action = ArgAction::SetTrue)]
    pub insecure: bool,

    /// Render and log alarms without calling the webhook.
    #[arg(long, action = ArgAction::SetTrue)]
    pub dry_run: bool,

    /// Emit JSON logs (requires `--features json-logs`).
    #[arg(long, action = ArgAction::SetTrue)]
    pub json_logs: bool,

    /// Explicit log filter (e.g. "alert_relay=debug").
    #[arg(long, value_name = "FILTER")]
    pub log_filter: Option<String>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
