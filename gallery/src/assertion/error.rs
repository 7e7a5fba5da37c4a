//! Identity assertion decoding errors

use thiserror::Error;

/// Errors that can occur while decoding an identity token
#[derive(Error, Debug)]
pub enum AssertionError {
    /// The token does not have exactly three segments
    #[error("Expected 3 token segments, found {0}")]
    SegmentCount(usize),

    /// A segment is empty
    #[error("Token segment {0} is empty")]
    EmptySegment(usize),

    /// A segment contains characters outside the base64url alphabet
    #[error("Token segment {0} is not base64url")]
    InvalidAlphabet(usize),

    /// The payload segment failed to decode
    #[error("Failed to decode payload: {0}")]
    PayloadEncoding(#[from] base64::DecodeError),

    /// The decoded payload is not UTF-8
    #[error("Payload is not valid UTF-8")]
    PayloadUtf8(#[from] std::string::FromUtf8Error),

    /// The decoded payload is not JSON
    #[error("Payload is not valid JSON: {0}")]
    PayloadJson(#[from] serde_json::Error),

    /// The decoded payload is JSON but not an object
    #[error("Payload is not a claims object")]
    NotAnObject,
}
