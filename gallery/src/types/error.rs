//! Error taxonomy at the component boundary

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::assertion::AssertionError;
use crate::identity_pool::IdentityPoolError;
use crate::media_storage::StorageError;

/// Startup configuration errors. These are the only fatal errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required setting is unset or blank
    #[error("Missing configuration value: {0}")]
    Missing(&'static str),

    /// `APP_ENV` holds an unknown stage
    #[error("Invalid environment: {0}")]
    InvalidEnvironment(String),

    /// The stack outputs document could not be parsed
    #[error("Stack outputs are not valid JSON: {0}")]
    OutputsJson(#[from] serde_json::Error),

    /// The stack outputs document lacks a required output
    #[error("Stack outputs do not contain {0}")]
    MissingOutput(&'static str),
}

/// Recoverable failures of a sign-in or gallery load
#[derive(Error, Debug)]
pub enum GalleryError {
    /// The identity token could not be decoded; no exchange was attempted
    #[error("Malformed identity assertion: {0}")]
    MalformedAssertion(#[from] AssertionError),

    /// The identity pool rejected the token or could not be reached
    #[error("Credential exchange failed: {0}")]
    CredentialExchangeFailed(#[source] IdentityPoolError),

    /// The object store listing failed
    #[error("Listing failed: {0}")]
    ListingFailed(#[source] StorageError),

    /// A signed URL could not be produced for one entry
    #[error("URL generation failed for {key}: {source}")]
    UrlGenerationFailed {
        key: String,
        #[source]
        source: StorageError,
    },

    /// No session is active
    #[error("No active session")]
    NotSignedIn,

    /// The temporary credentials have expired
    #[error("Session expired at {0}")]
    SessionExpired(DateTime<Utc>),

    /// A newer sign-in or a sign-out replaced the request while it was in flight
    #[error("Request superseded by a newer session change")]
    Superseded,
}

impl GalleryError {
    /// Inline text shown in place of the expected content
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::MalformedAssertion(_) => {
                "Sign-in failed: the Google credential could not be read.".to_string()
            }
            Self::CredentialExchangeFailed(err) => {
                format!("Failed to authenticate with AWS: {err}")
            }
            Self::ListingFailed(err) => format!("Error loading images: {err}"),
            Self::UrlGenerationFailed { key, .. } => format!("Could not load image {key}"),
            Self::NotSignedIn => common_types::SIGNED_OUT_STATUS.to_string(),
            Self::SessionExpired(_) => "Your session has expired. Please sign in again.".to_string(),
            Self::Superseded => "A newer sign-in replaced this request.".to_string(),
        }
    }

    /// Writes the diagnostic log entry for this failure
    #[allow(clippy::cognitive_complexity)]
    pub fn report(&self) {
        match self {
            Self::MalformedAssertion(err) => {
                tracing::warn!(error = %err, "Rejected malformed identity assertion");
            }
            Self::CredentialExchangeFailed(err) => {
                tracing::error!(error = %err, "Error exchanging credentials with identity pool");
            }
            Self::ListingFailed(err) => {
                tracing::error!(error = %err, "Error listing objects");
            }
            Self::UrlGenerationFailed { key, source } => {
                tracing::warn!(key = %key, error = %source, "Error creating signed URL, skipping");
            }
            Self::NotSignedIn => tracing::warn!("Gallery requested without an active session"),
            Self::SessionExpired(at) => {
                tracing::info!(expired_at = %at, "Session credentials expired");
            }
            Self::Superseded => tracing::warn!("Discarding stale result"),
        }
    }
}
