//! Markdown rendering of alarm envelopes for the chat webhook.

use std::fmt::Write as _;

use crate::event::{AlarmRecord, EventEnvelope};
use crate::types::{AlarmLevel, AlarmStatus};

/// Shown for any field the alarm did not carry.
pub const NOT_AVAILABLE: &str = "N/A";

/// Markdown hard line break: two trailing spaces before the newline.
const LINE_END: &str = "  \n";

pub const BADGE_OCCURRING: &str = "<font color=\"#FF0000\">Currently occurring ⚠️</font>";
pub const BADGE_RECOVERED: &str = "<font color=\"#00FF00\">Recovered 😀</font>";
pub const BADGE_LOW: &str = "<font color=\"#0000FF\">Low severity (🔥)</font>";
pub const BADGE_MEDIUM: &str = "<font color=\"#FFA500\">Medium severity (🔥🔥)</font>";
pub const BADGE_HIGH: &str = "<font color=\"#FF0000\">High severity (🔥🔥🔥)</font>";

#[must_use]
pub fn status_badge(status: &AlarmStatus) -> &str {
    match status {
        AlarmStatus::Raised => BADGE_OCCURRING,
        AlarmStatus::Recovered | AlarmStatus::Cleared => BADGE_RECOVERED,
        AlarmStatus::Other(raw) => raw,
    }
}

#[must_use]
pub fn level_badge(level: &AlarmLevel) -> &str {
    match level {
        AlarmLevel::Warning => BADGE_LOW,
        AlarmLevel::Critical => BADGE_MEDIUM,
        AlarmLevel::Fault => BADGE_HIGH,
        AlarmLevel::Other(raw) => raw,
    }
}

/// Render every retained record of `envelope`, one block per record, in order.
///
/// An envelope with no retained records renders as the empty string.
#[must_use]
pub fn render_markdown(envelope: &EventEnvelope) -> String {
    let mut out = String::new();
    for record in envelope.retained() {
        render_record(&mut out, record);
    }
    out
}

fn render_record(out: &mut String, record: &AlarmRecord) {
    line(out, "Alarm Name", or_na(record.alarm_name.as_deref()));
    line(
        out,
        "Alarm Status",
        record.status.as_ref().map_or(NOT_AVAILABLE, status_badge),
    );
    line(
        out,
        "Alarm Level",
        record.level.as_ref().map_or(NOT_AVAILABLE, level_badge),
    );
    line(out, "Raised Time", or_na(record.raised_time.as_deref()));
    line(out, "First Raised Time", or_na(record.first_raised_time.as_deref()));
    line(out, "Cluster Name", or_na(record.cluster_name.as_deref()));
    line(out, "Host Name", or_na(record.host_name.as_deref()));
    line(out, "Host IP", or_na(record.host_ip.as_deref()));
    line(out, "Source Type", or_na(record.source_type.as_deref()));
    line(out, "Details", or_na(record.details.as_deref()));
    line(
        out,
        "Current Observed Value",
        or_na(record.current_observed_value.as_deref()),
    );
    line(out, "Suggestions", or_na(record.suggestions.as_deref()));
}

fn or_na(value: Option<&str>) -> &str {
    value.unwrap_or(NOT_AVAILABLE)
}

fn line(out: &mut String, label: &str, value: &str) {
    let _ = write!(out, "**{label}:** {value}{LINE_END}");
}

#[cfg(test)]
mod tests {
    use super::{
        BADGE_HIGH, BADGE_LOW, BADGE_MEDIUM, BADGE_OCCURRING, BADGE_RECOVERED, level_badge,
        render_markdown, status_badge,
    };
    use crate::event::{AlarmRecord, EventEnvelope, RecordEntry};
    use crate::types::{AlarmLevel, AlarmStatus};

    const LINES_PER_RECORD: usize = 12;

    fn envelope(records: Vec<Option<AlarmRecord>>) -> EventEnvelope {
        EventEnvelope {
            records: records
                .into_iter()
                .map(|value| RecordEntry { value })
                .collect(),
        }
    }

    fn named(name: &str) -> AlarmRecord {
        AlarmRecord {
            alarm_name: Some(name.to_string()),
            ..AlarmRecord::default()
        }
    }

    #[test]
    fn status_badges() {
        assert_eq!(status_badge(&AlarmStatus::Raised), BADGE_OCCURRING);
        assert_eq!(status_badge(&AlarmStatus::Recovered), BADGE_RECOVERED);
        assert_eq!(
            status_badge(&AlarmStatus::Recovered),
            status_badge(&AlarmStatus::Cleared)
        );
        assert_eq!(
            status_badge(&AlarmStatus::Other("Acknowledged".into())),
            "Acknowledged"
        );
    }

    #[test]
    fn level_badges_are_distinct() {
        let badges = [
            level_badge(&AlarmLevel::Warning),
            level_badge(&AlarmLevel::Critical),
            level_badge(&AlarmLevel::Fault),
        ];
        assert_eq!(badges, [BADGE_LOW, BADGE_MEDIUM, BADGE_HIGH]);
        assert_ne!(badges[0], badges[1]);
        assert_ne!(badges[1], badges[2]);
        assert_ne!(badges[0], badges[2]);
        assert_eq!(level_badge(&AlarmLevel::Other("MINOR".into())), "MINOR");
    }

    #[test]
    fn renders_full_block() {
        let record = AlarmRecord {
            alarm_name: Some("Disk usage".into()),
            status: Some(AlarmStatus::Raised),
            level: Some(AlarmLevel::Critical),
            raised_time: Some("2024-01-02 03:04:05".into()),
            host_ip: Some("10.1.2.3".into()),
            ..AlarmRecord::default()
        };
        let text = render_markdown(&envelope(vec![Some(record)]));
        let expected = format!(
            "**Alarm Name:** Disk usage  \n\
             **Alarm Status:** {BADGE_OCCURRING}  \n\
             **Alarm Level:** {BADGE_MEDIUM}  \n\
             **Raised Time:** 2024-01-02 03:04:05  \n\
             **First Raised Time:** N/A  \n\
             **Cluster Name:** N/A  \n\
             **Host Name:** N/A  \n\
             **Host IP:** 10.1.2.3  \n\
             **Source Type:** N/A  \n\
             **Details:** N/A  \n\
             **Current Observed Value:** N/A  \n\
             **Suggestions:** N/A  \n"
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn one_block_per_retained_record_in_order() {
        let text = render_markdown(&envelope(vec![
            Some(named("a")),
            None,
            Some(named("b")),
            Some(named("c")),
        ]));
        assert_eq!(text.lines().count(), 3 * LINES_PER_RECORD);
        assert!(text.lines().all(|l| l.ends_with("  ")));

        let names: Vec<_> = text
            .lines()
            .filter_map(|l| l.strip_prefix("**Alarm Name:** "))
            .map(str::trim_end)
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn missing_status_and_level_render_sentinel() {
        let text = render_markdown(&envelope(vec![Some(AlarmRecord::default())]));
        assert!(text.contains("**Alarm Status:** N/A  \n"));
        assert!(text.contains("**Alarm Level:** N/A  \n"));
    }

    #[test]
    fn empty_envelope_renders_nothing() {
        assert!(render_markdown(&envelope(Vec::new())).is_empty());
        assert!(render_markdown(&envelope(vec![None, None])).is_empty());
    }
}
