//! Third-party identity assertion (Google ID token) handling.
//!
//! Only the payload segment is decoded, and only for presentation (greeting text).
//! The signature is never checked here: the identity pool validates the raw token
//! during the credential exchange, so decoded claims must not drive authorization.

mod error;
#[cfg(test)]
mod tests;

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub use error::AssertionError;

/// Fallback display name when the token carries no usable identity claim
pub const UNKNOWN_USER: &str = "unknown user";

/// Claims read from the token payload for UI text.
///
/// Claims are display-only, so a claim of an unexpected JSON type reads as absent
/// instead of rejecting the token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Claims {
    #[serde(default, deserialize_with = "lenient_string")]
    pub sub: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub picture: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub iss: Option<String>,
    /// A single audience, or the first one of an audience list
    #[serde(default, deserialize_with = "lenient_audience")]
    pub aud: Option<String>,
    /// Expiry in seconds since the epoch; fractional values are truncated
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub exp: Option<i64>,
}

impl Claims {
    /// Name for the greeting line: `name`, then `email`, then `sub`
    #[must_use]
    pub fn display_name(&self) -> &str {
        [&self.name, &self.email, &self.sub]
            .into_iter()
            .flatten()
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
            .unwrap_or(UNKNOWN_USER)
    }
}

/// A signed identity token plus its decoded (unverified) claims
#[derive(Clone)]
pub struct IdentityAssertion {
    token: String,
    claims: Claims,
}

impl IdentityAssertion {
    /// Checks the token shape and decodes the payload segment
    ///
    /// # Errors
    ///
    /// Returns an `AssertionError` if the token is not three non-empty base64url
    /// segments or the payload is not a JSON object
    pub fn parse(token: &str) -> Result<Self, AssertionError> {
        let token = token.trim();
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 {
            return Err(AssertionError::SegmentCount(segments.len()));
        }

        for (index, segment) in segments.iter().enumerate() {
            let segment = segment.trim_end_matches('=');
            if segment.is_empty() {
                return Err(AssertionError::EmptySegment(index));
            }
            if !segment
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
            {
                return Err(AssertionError::InvalidAlphabet(index));
            }
        }

        let claims = decode_claims(segments[1])?;

        Ok(Self {
            token: token.to_string(),
            claims,
        })
    }

    /// The raw token, as submitted to the identity pool
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub const fn claims(&self) -> &Claims {
        &self.claims
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        self.claims.display_name()
    }
}

impl fmt::Debug for IdentityAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityAssertion")
            .field("token", &"<redacted>")
            .field("claims", &self.claims)
            .finish()
    }
}

/// base64url -> UTF-8 -> JSON object -> `Claims`
fn decode_claims(segment: &str) -> Result<Claims, AssertionError> {
    let bytes = URL_SAFE_NO_PAD.decode(segment.trim_end_matches('='))?;
    let json = String::from_utf8(bytes)?;
    let value: Value = serde_json::from_str(&json)?;
    if !value.is_object() {
        return Err(AssertionError::NotAnObject);
    }

    Ok(serde_json::from_value(value)?)
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().map(ToString::to_string))
}

fn lenient_audience<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let audience = match &value {
        Value::Array(values) => values.iter().find_map(Value::as_str),
        other => other.as_str(),
    };
    Ok(audience.map(ToString::to_string))
}

#[allow(clippy::cast_possible_truncation)]
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_i64()
        .or_else(|| value.as_f64().map(|secs| secs as i64)))
}
