//! Federated session lifecycle.
//!
//! [`SessionManager`] is the single owner of the active [`Session`]. It drives the
//! `SignedOut -> Authenticating -> SignedIn -> SignedOut` state machine and guards
//! every asynchronous completion with a generation counter: a newer sign-in or a
//! sign-out bumps the generation, and any exchange or listing that started under
//! an older generation is discarded as [`GalleryError::Superseded`] instead of
//! overwriting newer state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use strum::Display;
use tracing::{info, warn};

use crate::assertion::IdentityAssertion;
use crate::identity_pool::{FederatedCredentials, IdentityPoolClient};
use crate::identity_provider::IdentityProviderClient;
use crate::media_storage::{list_visible_resources, Listing, ObjectStoreConnector};
use crate::types::{AppConfig, ConfigError, GalleryError, GOOGLE_PROVIDER_KEY, PETS_PREFIX};

/// Temporary credentials plus the identity they belong to
#[derive(Debug, Clone)]
pub struct Session {
    credentials: FederatedCredentials,
    display_name: String,
    issued_at: DateTime<Utc>,
}

impl Session {
    #[must_use]
    pub fn new(credentials: FederatedCredentials, display_name: impl Into<String>) -> Self {
        Self {
            credentials,
            display_name: display_name.into(),
            issued_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn identity_id(&self) -> &str {
        &self.credentials.identity_id
    }

    /// Greeting name taken from the (unverified) token claims
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub const fn credentials(&self) -> &FederatedCredentials {
        &self.credentials
    }

    #[must_use]
    pub const fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.credentials.expiration
    }

    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.credentials.expiration
    }
}

/// Per-session state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SessionState {
    SignedOut,
    Authenticating,
    SignedIn,
}

struct SessionSlot {
    state: SessionState,
    generation: u64,
    session: Option<Arc<Session>>,
}

/// Owns the active session and the identity provider's sign-in surface
pub struct SessionManager {
    config: AppConfig,
    identity_pool: Arc<dyn IdentityPoolClient>,
    identity_provider: Arc<dyn IdentityProviderClient>,
    slot: Mutex<SessionSlot>,
}

impl SessionManager {
    /// Creates a signed-out manager
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if any configuration field is blank
    pub fn new(
        config: AppConfig,
        identity_pool: Arc<dyn IdentityPoolClient>,
        identity_provider: Arc<dyn IdentityProviderClient>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            config,
            identity_pool,
            identity_provider,
            slot: Mutex::new(SessionSlot {
                state: SessionState::SignedOut,
                generation: 0,
                session: None,
            }),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// Exchanges an identity token for a new session.
    ///
    /// A malformed token is rejected before any exchange call and leaves the current
    /// state untouched. Otherwise exactly one exchange is issued; any previous session
    /// is dropped when it starts. On failure the manager returns to `SignedOut`.
    ///
    /// # Errors
    ///
    /// - `GalleryError::MalformedAssertion` if the token cannot be decoded
    /// - `GalleryError::CredentialExchangeFailed` if the identity pool rejects it
    /// - `GalleryError::Superseded` if another sign-in or a sign-out happened meanwhile
    pub async fn authenticate(&self, token: &str) -> Result<Arc<Session>, GalleryError> {
        let assertion = IdentityAssertion::parse(token)?;
        info!(user = assertion.display_name(), "Identity token received");

        let generation = {
            let mut slot = self.lock();
            slot.generation += 1;
            slot.state = SessionState::Authenticating;
            slot.session = None;
            slot.generation
        };

        let result = self
            .identity_pool
            .exchange(
                &self.config.identity_pool_id,
                GOOGLE_PROVIDER_KEY,
                assertion.token(),
            )
            .await;

        let mut slot = self.lock();
        if slot.generation != generation {
            warn!(
                generation,
                current = slot.generation,
                "Ignoring credential exchange completion for a superseded sign-in"
            );
            return Err(GalleryError::Superseded);
        }

        match result {
            Ok(credentials) => {
                let session = Arc::new(Session::new(credentials, assertion.display_name()));
                info!(identity_id = session.identity_id(), "Successfully authenticated with AWS");
                slot.state = SessionState::SignedIn;
                slot.session = Some(session.clone());
                Ok(session)
            }
            Err(err) => {
                slot.state = SessionState::SignedOut;
                Err(GalleryError::CredentialExchangeFailed(err))
            }
        }
    }

    /// The current session, if signed in and not expired.
    ///
    /// An expired session is dropped; there is no silent refresh.
    ///
    /// # Errors
    ///
    /// Returns `GalleryError::NotSignedIn` or `GalleryError::SessionExpired`
    pub fn active_session(&self) -> Result<Arc<Session>, GalleryError> {
        self.active_session_with_generation()
            .map(|(session, _)| session)
    }

    /// The active session together with the generation it belongs to, read
    /// under a single lock
    fn active_session_with_generation(&self) -> Result<(Arc<Session>, u64), GalleryError> {
        let mut slot = self.lock();
        let session = match (&slot.state, &slot.session) {
            (SessionState::SignedIn, Some(session)) => session.clone(),
            _ => return Err(GalleryError::NotSignedIn),
        };

        if session.is_expired_at(Utc::now()) {
            slot.state = SessionState::SignedOut;
            slot.session = None;
            slot.generation += 1;
            return Err(GalleryError::SessionExpired(session.expires_at()));
        }

        Ok((session, slot.generation))
    }

    /// Lists the gallery with the active session's credentials.
    ///
    /// # Errors
    ///
    /// - `GalleryError::NotSignedIn` / `GalleryError::SessionExpired` before any store call
    /// - `GalleryError::ListingFailed` if the listing request fails
    /// - `GalleryError::Superseded` if the session changed while the listing was in flight,
    ///   even when the listing itself failed
    pub async fn list_gallery(
        &self,
        connector: &dyn ObjectStoreConnector,
    ) -> Result<Listing, GalleryError> {
        let (session, generation) = self.active_session_with_generation()?;

        let store = connector.connect(&session);
        let result = list_visible_resources(
            store.as_ref(),
            &self.config.private_bucket_name,
            PETS_PREFIX,
        )
        .await;

        // Stale completions are dropped whether they succeeded or failed
        if self.lock().generation != generation {
            warn!(
                identity_id = session.identity_id(),
                "Ignoring listing completion for a session that is no longer active"
            );
            return Err(GalleryError::Superseded);
        }

        result
    }

    /// Drops the session and resets the identity provider for a fresh sign-in.
    pub fn sign_out(&self) {
        info!("Signing out");
        {
            let mut slot = self.lock();
            slot.generation += 1;
            slot.state = SessionState::SignedOut;
            slot.session = None;
        }

        self.identity_provider.revoke_session();
        self.identity_provider
            .initialize(&self.config.google_client_id);
        self.identity_provider.render_button();

        info!("Sign out complete");
    }

    fn lock(&self) -> MutexGuard<'_, SessionSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::identity_pool::mock::MockIdentityPool;

    #[test]
    fn test_session_expiry() {
        let mut credentials = MockIdentityPool::credentials_for("us-east-1:abc");
        credentials.expiration = Utc::now() + Duration::seconds(30);
        let session = Session::new(credentials, "Jane");

        assert!(!session.is_expired_at(Utc::now()));
        assert!(session.is_expired_at(Utc::now() + Duration::seconds(31)));
        assert_eq!(session.identity_id(), "us-east-1:abc");
        assert_eq!(session.display_name(), "Jane");
    }

    #[test]
    fn test_session_debug_hides_secrets() {
        let session = Session::new(MockIdentityPool::credentials_for("us-east-1:abc"), "Jane");
        let debug = format!("{session:?}");

        assert!(debug.contains("us-east-1:abc"));
        assert!(!debug.contains("mock-secret-key"));
        assert!(!debug.contains("mock-session-token"));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Authenticating.to_string(), "Authenticating");
    }
}
