//! Session credential decoding and expiry evaluation.
//!
//! A session credential is a three-segment, dot-delimited token whose middle
//! segment is a URL-safe base64 encoding of a JSON claims map. Decoding here
//! only extracts claims for display and expiry checks; the signature is the
//! backend's to verify, never the client's.
//!
//! [`crate::session::SessionStore`] is the only consumer: it collapses every
//! decode failure to "no identity", so [`DecodeError`] never crosses the
//! public session contract.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when decoding a session credential.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The token has fewer than two dot-delimited segments.
    #[error("credential must have at least two dot-delimited segments")]
    MissingPayload,

    /// The claims segment is not valid URL-safe base64.
    #[error("credential payload is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// The decoded claims segment is not a valid JSON claims map.
    #[error("credential payload is not valid claims JSON: {0}")]
    Claims(#[from] serde_json::Error),
}

/// The identity carried by a session credential.
///
/// Derived from a decoded claims map, never constructed directly; its
/// lifecycle is tied to the most recently accepted credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Subject identifier assigned by the auth backend.
    #[serde(rename = "sub")]
    pub subject_id: String,

    /// Email claim, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Whether the email claim has been verified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,

    /// Expiry as seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Every other claim, preserved verbatim.
    #[serde(flatten)]
    pub raw_claims: serde_json::Map<String, serde_json::Value>,
}

impl Identity {
    /// Whether this identity is expired at the given instant.
    ///
    /// An identity is valid only while its expiry is strictly in the future;
    /// a missing `exp` claim counts as expired.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp.is_none_or(|exp| exp <= now.timestamp())
    }

    /// Whether this identity is expired right now.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// The expiry instant, when the claim is present and representable.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }
}

/// Decode the claims payload of a session credential.
///
/// Extracts the middle dot-delimited segment, reverses the URL-safe base64
/// encoding (tolerating trailing padding), and parses the result as a claims
/// map.
///
/// # Errors
///
/// Returns [`DecodeError`] when the token has fewer than two segments, the
/// payload is not valid base64, or the decoded bytes are not a valid claims
/// map.
pub fn decode(token: &str) -> Result<Identity, DecodeError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or(DecodeError::MissingPayload)?;

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    let identity = serde_json::from_slice(&bytes)?;

    Ok(identity)
}
