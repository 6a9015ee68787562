use std::time::{Duration, Instant};

use backoff::ExponentialBackoffBuilder;
use backoff::backoff::Backoff;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::SecretString;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::Result;
use crate::config::WebhookSettings;
use crate::error::{ConfigError, DispatchError, Error};
use crate::signer;

use super::models::{MarkdownMessage, WebhookReply, body_preview};

const CORRELATION_HEADER: &str = "x-correlation-id";

/// Accepted webhook call.
#[derive(Clone, Debug)]
pub struct Delivery {
    pub status: StatusCode,
    /// Response body preview, logged but otherwise uninterpreted.
    pub body: String,
    pub attempts: usize,
}

#[derive(Clone)]
pub struct WebhookClient {
    http: reqwest::Client,
    url: Url,
    secret: SecretString,
    title: String,
    max_attempts: usize,
}

impl WebhookClient {
    /// Construit un client pour le robot configuré.
    ///
    /// # Errors
    ///
    /// Retourne une erreur si l'URL est en HTTP simple sans `insecure_http`,
    /// ou si le client HTTP sous-jacent ne peut pas être construit.
    pub fn new(settings: &WebhookSettings, insecure_http: bool) -> Result<Self> {
        if settings.url.scheme() != "https" && !insecure_http {
            return Err(Error::Config(ConfigError::InvalidField {
                field: "webhook.url",
                message: "only https URLs are accepted without --insecure".to_string(),
            }));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(concat!("alert-relay/", env!("CARGO_PKG_VERSION")))
            .pool_idle_timeout(Duration::from_secs(30));

        if !insecure_http {
            builder = builder.https_only(true);
        }

        let http = builder
            .build()
            .map_err(|err| DispatchError::Client { source: err })?;

        Ok(Self {
            http,
            url: settings.url.clone(),
            secret: settings.secret.clone(),
            title: settings.title.clone(),
            max_attempts: settings.max_attempts.max(1),
        })
    }

    /// Sign and post `text` as a markdown message.
    ///
    /// With a single configured attempt the call is best-effort: the first
    /// failure is returned. Otherwise transport errors and 5xx/408 statuses
    /// are retried with exponential backoff, re-signing each attempt.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] variants for transport failures, non-success
    /// statuses, robot-level rejections, or an exhausted retry budget.
    pub async fn send_markdown(&self, text: &str) -> Result<Delivery> {
        let mut backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(200))
            .with_multiplier(2.0)
            .with_randomization_factor(0.25)
            .with_max_interval(Duration::from_secs(2))
            .with_max_elapsed_time(None)
            .build();

        let mut attempt = 1;
        loop {
            let correlation_id = Uuid::now_v7().to_string();
            let err = match self.post_once(text, &correlation_id).await {
                Ok((status, body)) => {
                    info!(
                        %correlation_id,
                        attempt,
                        status = %status,
                        response = %body,
                        "webhook accepted notification"
                    );
                    return Ok(Delivery {
                        status,
                        body,
                        attempts: attempt,
                    });
                }
                Err(err) => err,
            };

            if !err.is_retriable() || self.max_attempts == 1 {
                return Err(err.into());
            }
            if attempt >= self.max_attempts {
                return Err(DispatchError::RetryExhausted {
                    source: Box::new(err),
                }
                .into());
            }
            let Some(delay) = backoff.next_backoff() else {
                return Err(err.into());
            };
            warn!(
                %correlation_id,
                attempt,
                delay_ms = delay.as_millis(),
                error = %err,
                "retrying webhook delivery"
            );
            sleep(delay).await;
            attempt += 1;
        }
    }

    async fn post_once(
        &self,
        text: &str,
        correlation_id: &str,
    ) -> std::result::Result<(StatusCode, String), DispatchError> {
        let started = Instant::now();
        let signature = signer::sign_now(&self.secret)?;
        let payload = MarkdownMessage::new(&self.title, text, &signature);

        let response = self
            .http
            .post(self.url.clone())
            .header(CORRELATION_HEADER, correlation_id)
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!(
            %correlation_id,
            status = %status,
            latency_ms = started.elapsed().as_millis(),
            "webhook responded"
        );

        if !status.is_success() {
            return Err(DispatchError::HttpStatus {
                status,
                body: body_preview(&body),
            });
        }
        if let Some(reply) = WebhookReply::parse(&body) {
            if let Some((code, message)) = reply.rejection() {
                return Err(DispatchError::Rejected {
                    code,
                    message: message.to_string(),
                });
            }
        }
        Ok((status, body_preview(&body)))
    }
}
