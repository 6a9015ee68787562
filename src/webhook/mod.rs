pub(crate) mod client;
pub(crate) mod models;

pub use client::{Delivery, WebhookClient};
pub use models::{MarkdownBody, MarkdownMessage, body_preview};
