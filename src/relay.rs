//! Per-message pipeline: locate the JSON fragment, repair, parse, render, dispatch.

use crate::Result;
use crate::error::PayloadError;
use crate::event::EventEnvelope;
use crate::format::render_markdown;
use crate::repair::repair_and_parse;
use crate::webhook::{Delivery, WebhookClient};

/// Everything from the first `{` onward; the syslog header before it is ignored.
#[must_use]
pub fn extract_fragment(message: &str) -> Option<&str> {
    message.find('{').map(|start| &message[start..])
}

/// Turn a raw syslog message into the markdown body to send.
///
/// # Errors
///
/// Returns [`PayloadError::NoJson`] when the message has no `{`,
/// [`PayloadError::Syntax`] when repair does not yield valid JSON, the
/// field errors of [`EventEnvelope::from_value`], and
/// [`PayloadError::NoRecords`] when no record carries a value, so that an
/// empty message is never sent.
pub fn prepare(message: &str) -> std::result::Result<String, PayloadError> {
    let fragment = extract_fragment(message).ok_or(PayloadError::NoJson)?;
    let doc = repair_and_parse(fragment)?;
    let envelope = EventEnvelope::from_value(&doc)?;
    if envelope.retained_count() == 0 {
        return Err(PayloadError::NoRecords);
    }
    Ok(render_markdown(&envelope))
}

#[derive(Debug)]
pub enum Outcome {
    Delivered(Delivery),
    /// Rendered but not sent (`--dry-run`).
    Skipped { text: String },
}

pub struct Relay {
    webhook: WebhookClient,
    dry_run: bool,
}

impl Relay {
    #[must_use]
    pub const fn new(webhook: WebhookClient, dry_run: bool) -> Self {
        Self { webhook, dry_run }
    }

    /// Run one inbound message through the pipeline. Exactly one webhook call
    /// is attempted per message unless the payload is rejected first.
    ///
    /// # Errors
    ///
    /// Returns payload errors before any network activity, and dispatch
    /// errors from the webhook call.
    pub async fn process(&self, message: &str) -> Result<Outcome> {
        let text = prepare(message)?;
        if self.dry_run {
            return Ok(Outcome::Skipped { text });
        }
        let delivery = self.webhook.send_markdown(&text).await?;
        Ok(Outcome::Delivered(delivery))
    }
}

#[cfg(test)]
mod tests {
    use super::{Outcome, Relay, extract_fragment, prepare};
    use crate::config::WebhookSettings;
    use crate::error::PayloadError;
    use crate::webhook::WebhookClient;
    use secrecy::SecretString;
    use std::time::Duration;

    const SYSLOG: &str = r#"<11>1 2024-05-06T07:08:09Z mgmt alarm - - - {"EventDesc":"{\"records\":[{\"value\":{\"alarmName\":\"Disk full\",\"Status\":\"RAISED\",\"Level\":\"WARNING\",\"HostName\":\"node-1\"}}]}"}"#;

    #[test]
    fn fragment_starts_at_first_brace() {
        assert_eq!(extract_fragment("hdr {\"a\":{}}"), Some("{\"a\":{}}"));
        assert_eq!(extract_fragment("no json here"), None);
    }

    #[test]
    fn prepares_wrapped_syslog_payload() {
        let text = prepare(SYSLOG).unwrap();
        assert!(text.starts_with("**Alarm Name:** Disk full  \n"));
        assert!(text.contains("**Host Name:** node-1  \n"));
        assert!(text.contains("Currently occurring"));
        assert!(text.contains("Low severity"));
    }

    #[test]
    fn message_without_json_is_rejected() {
        assert!(matches!(
            prepare("<11> plain text alarm"),
            Err(PayloadError::NoJson)
        ));
    }

    #[test]
    fn missing_event_desc_is_rejected() {
        assert!(matches!(
            prepare(r#"<11> {"records":[]}"#),
            Err(PayloadError::MissingField { field: "EventDesc" })
        ));
    }

    #[test]
    fn empty_records_are_not_sent() {
        assert!(matches!(
            prepare(r#"{"EventDesc":{"records":[]}}"#),
            Err(PayloadError::NoRecords)
        ));
        assert!(matches!(
            prepare(r#"{"EventDesc":{"records":[{"value":null}]}}"#),
            Err(PayloadError::NoRecords)
        ));
    }

    #[test]
    fn empty_values_are_skipped_alongside_real_alarms() {
        for empty in [r#""""#, "[]", "false", "0"] {
            let message = format!(
                r#"{{"EventDesc":{{"records":[{{"value":{empty}}},{{"value":{{"alarmName":"real alarm"}}}}]}}}}"#
            );
            let text = prepare(&message).unwrap();
            assert_eq!(text.matches("**Alarm Name:**").count(), 1, "value {empty}");
            assert!(text.starts_with("**Alarm Name:** real alarm  \n"));
        }
    }

    #[tokio::test]
    async fn dry_run_returns_rendered_text() {
        let webhook = WebhookClient::new(
            &WebhookSettings {
                url: "http://127.0.0.1:9/robot/send".parse().unwrap(),
                secret: SecretString::from("s3cr3t"),
                title: "Alarm Notification".to_string(),
                request_timeout: Duration::from_secs(1),
                connect_timeout: Duration::from_secs(1),
                max_attempts: 1,
            },
            true,
        )
        .unwrap();
        let relay = Relay::new(webhook, true);

        match relay.process(SYSLOG).await.unwrap() {
            Outcome::Skipped { text } => assert_eq!(text, prepare(SYSLOG).unwrap()),
            Outcome::Delivered(_) => panic!("dry run must not deliver"),
        }
    }
}
