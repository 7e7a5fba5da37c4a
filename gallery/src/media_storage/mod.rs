//! Private object store access: listing and signed retrieval URLs
mod error;

use std::sync::{Arc, LazyLock};
use std::time::{Duration, SystemTime};

use aws_sdk_s3::{config::Credentials, presigning::PresigningConfig, Client as S3Client};
use chrono::{DateTime, Utc};
use common_types::GalleryItem;
use futures::future::join_all;
use regex::Regex;
use strum::Display;
use tracing::{debug, info, warn};

pub use error::{StorageError, StorageResult};

use crate::session::Session;
use crate::types::{GalleryError, SIGNED_URL_EXPIRY};

static IMAGE_KEY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(jpg|jpeg|png|gif)$").expect("Invalid regex"));

/// One entry of a listing, in store order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub size: Option<i64>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl ObjectEntry {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            size: None,
            last_modified: None,
        }
    }
}

/// Object store operations available to a signed-in session
#[async_trait::async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Lists the entries of `container` under `prefix` with a single request
    async fn list(&self, container: &str, prefix: &str) -> StorageResult<Vec<ObjectEntry>>;

    /// Computes a signed GET URL for `key`, valid for `expires_in`
    ///
    /// Signing is local; no request is sent.
    async fn presign_get(
        &self,
        container: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;
}

/// Builds an [`ObjectStoreClient`] bound to a session's temporary credentials
pub trait ObjectStoreConnector: Send + Sync {
    fn connect(&self, session: &Session) -> Arc<dyn ObjectStoreClient>;
}

/// Why a successful listing has nothing to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum EmptyReason {
    /// The prefix holds no objects at all
    NoObjects,
    /// Objects exist but none has an image extension
    NoMatchingImages,
    /// Every matching image failed URL generation
    NoSignedUrls,
}

impl EmptyReason {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NoObjects => "No pet images found.",
            Self::NoMatchingImages => "No pet images found. Check file extensions.",
            Self::NoSignedUrls => "No pet images could be displayed.",
        }
    }
}

/// Outcome of a successful gallery listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    /// Signed images in store order
    Images(Vec<GalleryItem>),
    /// Explicit "loaded, but nothing to show"
    Empty(EmptyReason),
}

/// Whether `key` names a displayable image (`.jpg`, `.jpeg`, `.png`, `.gif`, any case)
#[must_use]
pub fn is_image_key(key: &str) -> bool {
    IMAGE_KEY_REGEX.is_match(key)
}

/// Lists `container` under `prefix` and signs every image entry for [`SIGNED_URL_EXPIRY`].
///
/// Entries without an image extension are skipped silently. A URL that cannot be
/// generated is logged and its entry skipped; the rest of the gallery is still
/// returned. Store order is preserved.
///
/// # Errors
///
/// Returns `GalleryError::ListingFailed` if the listing request fails
pub async fn list_visible_resources(
    store: &dyn ObjectStoreClient,
    container: &str,
    prefix: &str,
) -> Result<Listing, GalleryError> {
    info!(container, prefix, "Loading images");

    let entries = store
        .list(container, prefix)
        .await
        .map_err(GalleryError::ListingFailed)?;

    info!(count = entries.len(), "Objects found");

    if entries.is_empty() {
        return Ok(Listing::Empty(EmptyReason::NoObjects));
    }

    let images: Vec<ObjectEntry> = entries
        .into_iter()
        .inspect(|entry| debug!(key = %entry.key, "Processing object"))
        .filter(|entry| is_image_key(&entry.key))
        .collect();

    if images.is_empty() {
        return Ok(Listing::Empty(EmptyReason::NoMatchingImages));
    }

    let signed = join_all(images.into_iter().map(|entry| async move {
        let result = store
            .presign_get(container, &entry.key, SIGNED_URL_EXPIRY)
            .await;
        (entry.key, result)
    }))
    .await;

    let items: Vec<GalleryItem> = signed
        .into_iter()
        .filter_map(|(key, result)| match result {
            Ok(url) => {
                debug!(key = %key, "Created signed URL");
                Some(GalleryItem { key, url })
            }
            Err(source) => {
                GalleryError::UrlGenerationFailed { key, source }.report();
                None
            }
        })
        .collect();

    info!(count = items.len(), "Images signed");

    if items.is_empty() {
        return Ok(Listing::Empty(EmptyReason::NoSignedUrls));
    }

    Ok(Listing::Images(items))
}

/// S3 implementation of [`ObjectStoreClient`]
pub struct S3ObjectStore {
    client: S3Client,
}

impl S3ObjectStore {
    #[must_use]
    pub const fn new(client: S3Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ObjectStoreClient for S3ObjectStore {
    async fn list(&self, container: &str, prefix: &str) -> StorageResult<Vec<ObjectEntry>> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(container)
            .prefix(prefix)
            .send()
            .await?;

        if output.is_truncated().unwrap_or(false) {
            warn!(container, prefix, "Listing truncated, showing first page only");
        }

        Ok(output
            .contents()
            .iter()
            .filter_map(|object| {
                object.key().map(|key| ObjectEntry {
                    key: key.to_string(),
                    size: object.size(),
                    last_modified: object
                        .last_modified()
                        .and_then(|dt| DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())),
                })
            })
            .collect())
    }

    async fn presign_get(
        &self,
        container: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let presigned_config = PresigningConfig::expires_in(expires_in).map_err(|e| {
            StorageError::ConfigError(format!("Failed to create presigning config: {e}"))
        })?;

        let presigned = self
            .client
            .get_object()
            .bucket(container)
            .key(key)
            .presigned(presigned_config)
            .await?;

        Ok(presigned.uri().to_string())
    }
}

/// Connects [`S3ObjectStore`]s using a base S3 config plus session credentials
pub struct S3Connector {
    base_config: aws_sdk_s3::Config,
}

impl S3Connector {
    #[must_use]
    pub const fn new(base_config: aws_sdk_s3::Config) -> Self {
        Self { base_config }
    }
}

impl ObjectStoreConnector for S3Connector {
    fn connect(&self, session: &Session) -> Arc<dyn ObjectStoreClient> {
        let credentials = session.credentials();
        let provider = Credentials::new(
            &credentials.access_key_id,
            &credentials.secret_key,
            Some(credentials.session_token.clone()),
            Some(SystemTime::from(credentials.expiration)),
            "CognitoIdentity",
        );

        let config = self
            .base_config
            .to_builder()
            .credentials_provider(provider)
            .build();

        Arc::new(S3ObjectStore::new(S3Client::from_conf(config)))
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tokio::sync::Notify;

    use super::{
        ObjectEntry, ObjectStoreClient, ObjectStoreConnector, StorageError, StorageResult,
    };
    use crate::session::Session;

    /// A recorded call to `presign_get`
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct PresignCall {
        pub container: String,
        pub key: String,
        pub expires_in: Duration,
    }

    /// In-memory store with scripted failures
    #[derive(Default)]
    pub struct MockObjectStore {
        entries: Vec<ObjectEntry>,
        list_error: Option<String>,
        failing_keys: HashSet<String>,
        list_gate: Option<Arc<Notify>>,
        list_calls: Mutex<Vec<(String, String)>>,
        presign_calls: Mutex<Vec<PresignCall>>,
    }

    impl MockObjectStore {
        #[must_use]
        pub fn with_keys(keys: &[&str]) -> Self {
            Self {
                entries: keys.iter().map(|key| ObjectEntry::new(*key)).collect(),
                ..Self::default()
            }
        }

        /// Every listing fails with `message`
        #[must_use]
        pub fn failing_listing(message: &str) -> Self {
            Self {
                list_error: Some(message.to_string()),
                ..Self::default()
            }
        }

        /// Presigning `key` fails
        #[must_use]
        pub fn failing_presign_for(mut self, key: &str) -> Self {
            self.failing_keys.insert(key.to_string());
            self
        }

        /// Listings wait for `gate` before answering
        #[must_use]
        pub fn gated(mut self, gate: Arc<Notify>) -> Self {
            self.list_gate = Some(gate);
            self
        }

        #[must_use]
        pub fn list_calls(&self) -> Vec<(String, String)> {
            self.list_calls.lock().expect("mock lock poisoned").clone()
        }

        #[must_use]
        pub fn presign_calls(&self) -> Vec<PresignCall> {
            self.presign_calls.lock().expect("mock lock poisoned").clone()
        }
    }

    #[async_trait::async_trait]
    impl ObjectStoreClient for MockObjectStore {
        async fn list(&self, container: &str, prefix: &str) -> StorageResult<Vec<ObjectEntry>> {
            self.list_calls
                .lock()
                .expect("mock lock poisoned")
                .push((container.to_string(), prefix.to_string()));

            if let Some(gate) = &self.list_gate {
                gate.notified().await;
            }

            if let Some(message) = &self.list_error {
                return Err(StorageError::S3Error(message.clone()));
            }

            Ok(self
                .entries
                .iter()
                .filter(|entry| entry.key.starts_with(prefix))
                .cloned()
                .collect())
        }

        async fn presign_get(
            &self,
            container: &str,
            key: &str,
            expires_in: Duration,
        ) -> StorageResult<String> {
            self.presign_calls
                .lock()
                .expect("mock lock poisoned")
                .push(PresignCall {
                    container: container.to_string(),
                    key: key.to_string(),
                    expires_in,
                });

            if self.failing_keys.contains(key) {
                return Err(StorageError::PresignError(format!("cannot sign {key}")));
            }

            Ok(format!(
                "https://{container}.s3.mock/{key}?X-Amz-Expires={}",
                expires_in.as_secs()
            ))
        }
    }

    /// Hands out one shared [`MockObjectStore`] and records who connected
    pub struct MockConnector {
        store: Arc<MockObjectStore>,
        connections: Mutex<Vec<String>>,
    }

    impl MockConnector {
        #[must_use]
        pub fn new(store: Arc<MockObjectStore>) -> Self {
            Self {
                store,
                connections: Mutex::new(Vec::new()),
            }
        }

        /// Identity ids of every session that connected
        #[must_use]
        pub fn connections(&self) -> Vec<String> {
            self.connections.lock().expect("mock lock poisoned").clone()
        }
    }

    impl ObjectStoreConnector for MockConnector {
        fn connect(&self, session: &Session) -> Arc<dyn ObjectStoreClient> {
            self.connections
                .lock()
                .expect("mock lock poisoned")
                .push(session.identity_id().to_string());
            self.store.clone()
        }
    }
}
