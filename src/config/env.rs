use std::time::Duration;

use humantime::parse_duration;

use crate::error::ConfigError;

/// Source of flat override variables; the process environment in production.
pub(super) type Lookup<'a> = &'a dyn Fn(&'static str) -> Result<Option<String>, ConfigError>;

pub(super) fn process_env(key: &'static str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(ConfigError::InvalidField {
            field: key,
            message: err.to_string(),
        }),
    }
}

/// Les valeurs vides sont traitées comme absentes.
pub(super) fn string(lookup: Lookup<'_>, key: &'static str) -> Result<Option<String>, ConfigError> {
    Ok(lookup(key)?
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty()))
}

pub(super) fn parsed<T>(lookup: Lookup<'_>, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    string(lookup, key)?
        .map(|value| {
            value.parse::<T>().map_err(|err| ConfigError::InvalidField {
                field: key,
                message: err.to_string(),
            })
        })
        .transpose()
}

pub(super) fn duration(
    lookup: Lookup<'_>,
    key: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    string(lookup, key)?
        .map(|value| {
            parse_duration(&value).map_err(|err| ConfigError::InvalidField {
                field: key,
                message: err.to_string(),
            })
        })
        .transpose()
}
