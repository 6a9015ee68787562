use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::error::DispatchError;

type HmacSha256 = Hmac<Sha256>;

/// Timestamp and signature pair attached to one webhook request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Signature {
    /// Milliseconds since the Unix epoch, as sent on the wire.
    pub timestamp: String,
    /// Base64 HMAC-SHA256, percent-escaped.
    pub sign: String,
}

/// Signe avec l'horloge courante ; chaque appel prend un nouvel horodatage.
///
/// # Errors
///
/// See [`sign_at`].
pub fn sign_now(secret: &SecretString) -> Result<Signature, DispatchError> {
    sign_at(secret, Utc::now().timestamp_millis())
}

/// Sign `"{timestamp_ms}\n{secret}"` with `secret` as the HMAC key.
///
/// # Errors
///
/// Returns [`DispatchError::Signing`] if the HMAC cannot be keyed.
pub fn sign_at(secret: &SecretString, timestamp_ms: i64) -> Result<Signature, DispatchError> {
    let secret = secret.expose_secret();
    let timestamp = timestamp_ms.to_string();

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|err| DispatchError::Signing {
            message: err.to_string(),
        })?;
    mac.update(timestamp.as_bytes());
    mac.update(b"\n");
    mac.update(secret.as_bytes());
    let digest = mac.finalize().into_bytes();

    let encoded = STANDARD.encode(digest);
    Ok(Signature {
        timestamp,
        sign: urlencoding::encode(&encoded).into_owned(),
    })
}
