use serde::Deserialize;
use serde_json::Value;

use crate::error::PayloadError;
use crate::types::{AlarmLevel, AlarmStatus};

/// One alarm occurrence. Absent fields stay `None`; rendering decides how to show them.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AlarmRecord {
    pub alarm_name: Option<String>,
    pub status: Option<AlarmStatus>,
    pub level: Option<AlarmLevel>,
    pub raised_time: Option<String>,
    pub first_raised_time: Option<String>,
    pub cluster_name: Option<String>,
    pub host_name: Option<String>,
    pub host_ip: Option<String>,
    pub source_type: Option<String>,
    pub details: Option<String>,
    pub current_observed_value: Option<String>,
    pub suggestions: Option<String>,
}

/// Entry of `EventDesc.records`; `value` is `None` when the sender omitted it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RecordEntry {
    pub value: Option<AlarmRecord>,
}

/// Decoded alarm message, records kept in wire order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct EventEnvelope {
    pub records: Vec<RecordEntry>,
}

impl EventEnvelope {
    /// Decode a parsed JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::MissingField`] when `EventDesc` or
    /// `EventDesc.records` is absent, and [`PayloadError::InvalidField`] when
    /// either has the wrong shape or a record value cannot be decoded.
    pub fn from_value(doc: &Value) -> Result<Self, PayloadError> {
        let event_desc = match doc.get("EventDesc") {
            None | Some(Value::Null) => {
                return Err(PayloadError::MissingField { field: "EventDesc" });
            }
            Some(Value::Object(map)) if map.is_empty() => {
                return Err(PayloadError::MissingField { field: "EventDesc" });
            }
            Some(Value::String(text)) if text.is_empty() => {
                return Err(PayloadError::MissingField { field: "EventDesc" });
            }
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(PayloadError::InvalidField {
                    field: "EventDesc",
                    message: format!("expected an object, got {}", kind(other)),
                });
            }
        };

        let records = match event_desc.get("records") {
            None | Some(Value::Null) => {
                return Err(PayloadError::MissingField {
                    field: "EventDesc.records",
                });
            }
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(PayloadError::InvalidField {
                    field: "EventDesc.records",
                    message: format!("expected an array, got {}", kind(other)),
                });
            }
        };

        let records = records
            .iter()
            .map(RecordEntry::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { records })
    }

    /// Records that carry a value, in order.
    pub fn retained(&self) -> impl Iterator<Item = &AlarmRecord> {
        self.records.iter().filter_map(|entry| entry.value.as_ref())
    }

    #[must_use]
    pub fn retained_count(&self) -> usize {
        self.retained().count()
    }
}

impl RecordEntry {
    fn from_value(entry: &Value) -> Result<Self, PayloadError> {
        let Value::Object(entry) = entry else {
            return Err(PayloadError::InvalidField {
                field: "EventDesc.records",
                message: format!("expected record objects, got {}", kind(entry)),
            });
        };

        let value = match entry.get("value") {
            None => None,
            Some(value) if is_empty_value(value) => None,
            Some(record @ Value::Object(_)) => Some(decode_record(record)?),
            Some(other) => {
                return Err(PayloadError::InvalidField {
                    field: "value",
                    message: format!("expected an object, got {}", kind(other)),
                });
            }
        };
        Ok(Self { value })
    }
}

/// Values a sender uses to mean "no alarm here": null, `false`, zero, and
/// empty strings, arrays or objects.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n.abs() < f64::EPSILON),
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

fn decode_record(record: &Value) -> Result<AlarmRecord, PayloadError> {
    RawRecord::deserialize(record)
        .map(AlarmRecord::from)
        .map_err(|err| PayloadError::InvalidField {
            field: "value",
            message: err.to_string(),
        })
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default, rename = "alarmName", deserialize_with = "deserialize_opt_text")]
    alarm_name: Option<String>,
    #[serde(default, rename = "Status", deserialize_with = "deserialize_opt_text")]
    status: Option<String>,
    #[serde(default, rename = "Level", deserialize_with = "deserialize_opt_text")]
    level: Option<String>,
    #[serde(
        default,
        rename = "alarmRaisedTime",
        deserialize_with = "deserialize_opt_text"
    )]
    raised_time: Option<String>,
    #[serde(
        default,
        rename = "alarmFirstRaisedTime",
        deserialize_with = "deserialize_opt_text"
    )]
    first_raised_time: Option<String>,
    #[serde(default, rename = "ClusterName", deserialize_with = "deserialize_opt_text")]
    cluster_name: Option<String>,
    #[serde(default, rename = "HostName", deserialize_with = "deserialize_opt_text")]
    host_name: Option<String>,
    #[serde(default, rename = "HostIP", deserialize_with = "deserialize_opt_text")]
    host_ip: Option<String>,
    #[serde(default, rename = "SourceType", deserialize_with = "deserialize_opt_text")]
    source_type: Option<String>,
    #[serde(default, rename = "Details", deserialize_with = "deserialize_opt_text")]
    details: Option<String>,
    #[serde(
        default,
        rename = "CurrentObservedValue",
        deserialize_with = "deserialize_opt_text"
    )]
    current_observed_value: Option<String>,
    #[serde(default, rename = "Suggestions", deserialize_with = "deserialize_opt_text")]
    suggestions: Option<String>,
}

impl From<RawRecord> for AlarmRecord {
    fn from(raw: RawRecord) -> Self {
        Self {
            alarm_name: raw.alarm_name,
            status: raw.status.as_deref().map(AlarmStatus::from),
            level: raw.level.as_deref().map(AlarmLevel::from),
            raised_time: raw.raised_time,
            first_raised_time: raw.first_raised_time,
            cluster_name: raw.cluster_name,
            host_name: raw.host_name,
            host_ip: raw.host_ip,
            source_type: raw.source_type,
            details: raw.details,
            current_observed_value: raw.current_observed_value,
            suggestions: raw.suggestions,
        }
    }
}

/// Strings pass through untouched; other scalars keep their JSON text.
fn deserialize_opt_text<'de, D>(de: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(de)? {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}
