//! Error types for object store operations

use aws_sdk_s3::{
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    operation::{get_object::GetObjectError, list_objects_v2::ListObjectsV2Error},
};
use thiserror::Error;

/// Result type for object store operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during object store operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// S3 service error, provider message verbatim
    #[error("{0}")]
    S3Error(String),

    /// AWS SDK error (dispatch, timeout, response parsing)
    #[error("AWS SDK error: {0}")]
    AwsError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Presigned URL could not be produced
    #[error("Failed to generate presigned URL: {0}")]
    PresignError(String),
}

impl From<SdkError<ListObjectsV2Error>> for StorageError {
    fn from(error: SdkError<ListObjectsV2Error>) -> Self {
        match error {
            SdkError::ServiceError(err) => Self::S3Error(
                err.err()
                    .message()
                    .map_or_else(|| format!("{:?}", err.err()), ToString::to_string),
            ),
            _ => Self::AwsError(DisplayErrorContext(&error).to_string()),
        }
    }
}

impl From<SdkError<GetObjectError>> for StorageError {
    fn from(error: SdkError<GetObjectError>) -> Self {
        Self::PresignError(DisplayErrorContext(&error).to_string())
    }
}
