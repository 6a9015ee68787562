use serde::{Deserialize, Serialize};

use crate::signer::Signature;

const BODY_PREVIEW_LIMIT: usize = 256;
const MSGTYPE_MARKDOWN: &str = "markdown";

/// Request body of a markdown robot message.
#[derive(Debug, Serialize)]
pub struct MarkdownMessage<'a> {
    pub msgtype: &'static str,
    pub markdown: MarkdownBody<'a>,
    pub sign: &'a str,
    pub timestamp: &'a str,
}

#[derive(Debug, Serialize)]
pub struct MarkdownBody<'a> {
    pub title: &'a str,
    pub text: &'a str,
}

impl<'a> MarkdownMessage<'a> {
    #[must_use]
    pub fn new(title: &'a str, text: &'a str, signature: &'a Signature) -> Self {
        Self {
            msgtype: MSGTYPE_MARKDOWN,
            markdown: MarkdownBody { title, text },
            sign: signature.sign.as_str(),
            timestamp: signature.timestamp.as_str(),
        }
    }
}

/// Status object returned by DingTalk/WeCom (`errcode`) and Feishu (`code`) robots.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct WebhookReply {
    #[serde(default, alias = "code")]
    pub(crate) errcode: Option<i64>,
    #[serde(default, alias = "msg")]
    pub(crate) errmsg: Option<String>,
}

impl WebhookReply {
    /// `None` for bodies that are not a JSON object; such replies are accepted as-is.
    pub(crate) fn parse(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }

    pub(crate) fn rejection(&self) -> Option<(i64, &str)> {
        match self.errcode {
            Some(code) if code != 0 => Some((code, self.errmsg.as_deref().unwrap_or_default())),
            _ => None,
        }
    }
}

/// Single-line, bounded rendering of a body for logs.
#[must_use]
pub fn body_preview(body: &[u8]) -> String {
    if body.is_empty() {
        return "<empty>".to_string();
    }
    let end = body.len().min(BODY_PREVIEW_LIMIT);
    let mut preview = String::from_utf8_lossy(&body[..end]).to_string();
    if body.len() > BODY_PREVIEW_LIMIT {
        preview.push_str("...");
    }
    preview.replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::{MarkdownMessage, WebhookReply, body_preview};
    use crate::signer::Signature;

    #[test]
    fn request_body_snapshot() {
        let signature = Signature {
            timestamp: "1700000000000".to_string(),
            sign: "jRhQKmcWDB38YUNeCEXp9yo%2FI5OBM7UP81cpTrETHUw%3D".to_string(),
        };
        let message = MarkdownMessage::new("Alarm Notification", "**Alarm Name:** cpu  \n", &signature);
        insta::assert_json_snapshot!("markdown_request_body", message);
    }

    #[test]
    fn dingtalk_error_codes_are_rejections() {
        let reply = WebhookReply::parse(br#"{"errcode":310000,"errmsg":"sign not match"}"#).unwrap();
        assert_eq!(reply.rejection(), Some((310_000, "sign not match")));

        let ok = WebhookReply::parse(br#"{"errcode":0,"errmsg":"ok"}"#).unwrap();
        assert_eq!(ok.rejection(), None);
    }

    #[test]
    fn feishu_code_field_is_understood() {
        let reply = WebhookReply::parse(br#"{"code":19021,"msg":"sign match fail"}"#).unwrap();
        assert_eq!(reply.rejection(), Some((19_021, "sign match fail")));
    }

    #[test]
    fn non_json_replies_are_not_interpreted() {
        assert!(WebhookReply::parse(b"ok").is_none());
    }

    #[test]
    fn preview_is_bounded_and_single_line() {
        assert_eq!(body_preview(b""), "<empty>");
        assert_eq!(body_preview(b"a\nb"), "a\\nb");
        let long = vec![b'x'; 300];
        let preview = body_preview(&long);
        assert_eq!(preview.len(), 259);
        assert!(preview.ends_with("..."));
    }
}
