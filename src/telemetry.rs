use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt};

use crate::Result;
use crate::error::Error;

const DEFAULT_FILTER: &str = "info";

/// Installe le subscriber tracing global du relais.
///
/// # Errors
///
/// Retourne une erreur si aucun filtre candidat n'est valide, si la sortie JSON
/// est demandée sans la fonctionnalité `json-logs`, ou si un subscriber global
/// est déjà installé.
pub fn init_tracing(explicit_filter: Option<&str>, use_json: bool) -> Result<()> {
    let filter = resolve_filter(explicit_filter, std::env::var("RUST_LOG").ok().as_deref())?;
    let registry = Registry::default().with(filter);
    let layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if use_json {
        #[cfg(feature = "json-logs")]
        return tracing::subscriber::set_global_default(
            registry.with(layer.json().flatten_event(true)),
        )
        .map_err(|err| Error::Telemetry(err.to_string()));

        #[cfg(not(feature = "json-logs"))]
        return Err(Error::Telemetry(
            "binary was built without the `json-logs` feature".to_string(),
        ));
    }

    tracing::subscriber::set_global_default(registry.with(layer))
        .map_err(|err| Error::Telemetry(err.to_string()))
}

/// First parseable filter wins: CLI flag, then `RUST_LOG`, then `info`.
fn resolve_filter(explicit: Option<&str>, from_env: Option<&str>) -> Result<EnvFilter> {
    [explicit, from_env, Some(DEFAULT_FILTER)]
        .into_iter()
        .flatten()
        .find_map(|candidate| EnvFilter::try_new(candidate).ok())
        .ok_or_else(|| Error::Telemetry("invalid log filter".to_string()))
}

#[cfg(test)]
mod tests {
    use super::resolve_filter;

    #[test]
    fn invalid_explicit_filter_falls_back() {
        let filter = resolve_filter(Some("alert_relay=notalevel"), None).unwrap();
        assert_eq!(filter.to_string(), "info");
    }

    #[test]
    fn explicit_filter_beats_environment() {
        let filter = resolve_filter(Some("alert_relay=debug"), Some("warn")).unwrap();
        assert_eq!(filter.to_string(), "alert_relay=debug");
    }
}
