//! Federated pet gallery: Google sign-in, Cognito credential exchange and
//! signed S3 retrieval URLs

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

/// UI controller
pub mod app;

/// Identity token decoding
pub mod assertion;

/// Identity pool credential exchange
pub mod identity_pool;

/// Third-party sign-in client
pub mod identity_provider;

/// Object store listing and signed URLs
pub mod media_storage;

/// Session lifecycle
pub mod session;

/// Configuration, environment and errors
pub mod types;
