use std::path::PathBuf;
use std::sync::Arc;

use alert_relay::Result;
use alert_relay::config::Config;
use alert_relay::listener::Listener;
use alert_relay::relay::Relay;
use alert_relay::telemetry::init_tracing;
use alert_relay::webhook::WebhookClient;
use tokio::signal;
use tracing::{info, warn};

use super::cli::Cli;

const DEFAULT_CONFIG: &str = "alert-relay.toml";

pub async fn run(cli: Cli) -> Result<()> {
    init_tracing(cli.log_filter.as_deref(), cli.json_logs)?;

    let config_path = cli.config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let mut config = Config::from_env_and_file(&config_path)?;
    if let Some(addr) = cli.listen {
        config.listener.addr = addr;
    }

    let webhook = WebhookClient::new(&config.webhook, cli.insecure)?;
    let relay = Arc::new(Relay::new(webhook, cli.dry_run));

    let listener = Listener::bind(&config.listener).await?;
    info!(
        addr = %listener.local_addr()?,
        webhook_host = config.webhook.url.host_str().unwrap_or("<none>"),
        max_connections = config.listener.max_connections,
        dry_run = cli.dry_run,
        "syslog listener ready"
    );

    listener.serve(relay, shutdown_signal()).await;
    info!("alert relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received, draining connections");
}
