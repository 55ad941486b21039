//! Bearer token decoding
//!
//! The API issues HS256 JWTs with `userID`, `username` and `exp` claims. The
//! client only reads the payload to learn who is logged in; it never checks
//! the signature and never mints tokens.

use crate::error::{ZyrosError, ZyrosResult};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

/// Claims carried by the bearer token
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    /// Subject identifier
    #[serde(rename = "userID", deserialize_with = "deserialize_user_id")]
    pub user_id: u64,
    #[serde(default)]
    pub username: Option<String>,
    /// Expiry as unix seconds
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Expiry instant, if the token carries one
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single())
    }

    /// Check expiry against the given instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|expiry| expiry <= now)
    }

    /// Check expiry against the wall clock
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Decode the payload segment of a JWT.
///
/// Malformed input yields [`ZyrosError::Token`]; this never panics.
pub fn decode_token(token: &str) -> ZyrosResult<TokenClaims> {
    let mut segments = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(ZyrosError::token("Token must have three segments"));
    };

    // Some encoders keep the padding even though JWTs should not
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| ZyrosError::token(format!("Payload is not base64url: {}", e)))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| ZyrosError::token(format!("Payload is not a claim set: {}", e)))
}

/// `userID` arrives as a JSON number that may be encoded as a float
fn deserialize_user_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Number::deserialize(deserializer)?;
    if let Some(id) = value.as_u64() {
        return Ok(id);
    }
    match value.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
        _ => Err(serde::de::Error::custom(format!(
            "userID must be a non-negative integer, got {}",
            value
        ))),
    }
}
