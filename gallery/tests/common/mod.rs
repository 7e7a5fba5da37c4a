#![allow(dead_code)]

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use gallery::{
    app::GalleryApp,
    identity_pool::mock::MockIdentityPool,
    identity_provider::HeadlessProvider,
    media_storage::mock::{MockConnector, MockObjectStore},
    session::SessionManager,
    types::AppConfig,
};
use serde_json::json;

pub const POOL_ID: &str = "us-east-1:af391233-f192-4753-a5c0-a4dadcdb6c9e";
pub const CLIENT_ID: &str = "421640755879-test.apps.googleusercontent.com";
pub const BUCKET: &str = "privatedatabucket";

/// Initialize tracing for tests
pub fn setup_test_env() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

pub fn test_config() -> AppConfig {
    AppConfig {
        identity_pool_id: POOL_ID.to_string(),
        google_client_id: CLIENT_ID.to_string(),
        private_bucket_name: BUCKET.to_string(),
        region: "us-east-1".to_string(),
    }
}

/// A well-formed Google-style ID token for `name` (signature is not checked locally)
pub fn create_id_token(name: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","kid":"test","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        json!({
            "iss": "https://accounts.google.com",
            "aud": CLIENT_ID,
            "sub": "110169484474386276334",
            "name": name,
            "exp": 4_102_444_800_i64,
        })
        .to_string(),
    );
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

pub fn pet_keys(names: &[&str]) -> Vec<String> {
    names
        .iter()
        .map(|name| format!("private-data/pets/{name}"))
        .collect()
}

/// Mocks wired into both a bare `SessionManager` and a `GalleryApp`
pub struct TestContext {
    pub identity_pool: Arc<MockIdentityPool>,
    pub identity_provider: Arc<HeadlessProvider>,
    pub store: Arc<MockObjectStore>,
    pub connector: Arc<MockConnector>,
}

impl TestContext {
    pub fn new(store: MockObjectStore) -> Self {
        setup_test_env();

        let store = Arc::new(store);
        Self {
            identity_pool: Arc::new(MockIdentityPool::new()),
            identity_provider: Arc::new(HeadlessProvider::new()),
            connector: Arc::new(MockConnector::new(store.clone())),
            store,
        }
    }

    pub fn with_pets(names: &[&str]) -> Self {
        let keys = pet_keys(names);
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        Self::new(MockObjectStore::with_keys(&keys))
    }

    pub fn session_manager(&self) -> SessionManager {
        SessionManager::new(
            test_config(),
            self.identity_pool.clone(),
            self.identity_provider.clone(),
        )
        .expect("valid test config")
    }

    pub fn app(&self) -> GalleryApp {
        GalleryApp::new(
            test_config(),
            self.identity_pool.clone(),
            self.identity_provider.clone(),
            self.connector.clone(),
        )
        .expect("valid test config")
    }
}
