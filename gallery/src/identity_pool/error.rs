//! Identity pool exchange errors

use aws_sdk_cognitoidentity::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error;

/// Result type for identity pool operations
pub type IdentityPoolResult<T> = Result<T, IdentityPoolError>;

/// Errors that can occur while exchanging a token for credentials
#[derive(Error, Debug)]
pub enum IdentityPoolError {
    /// The pool rejected the request; carries the provider message verbatim
    #[error("{0}")]
    Rejected(String),

    /// The request never produced a service response (network, timeout, dispatch)
    #[error("AWS SDK error: {0}")]
    AwsError(String),

    /// The service answered without a required field
    #[error("Identity pool response is missing {0}")]
    IncompleteResponse(&'static str),
}

impl<E, R> From<SdkError<E, R>> for IdentityPoolError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    fn from(error: SdkError<E, R>) -> Self {
        match error.as_service_error() {
            Some(service_err) => Self::Rejected(
                service_err
                    .message()
                    .map_or_else(|| service_err.to_string(), ToString::to_string),
            ),
            None => Self::AwsError(DisplayErrorContext(&error).to_string()),
        }
    }
}
