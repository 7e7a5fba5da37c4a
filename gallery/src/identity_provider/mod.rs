//! Third-party sign-in client capability

use std::sync::{Mutex, PoisonError};

use tracing::{debug, info};

/// Sign-in surface of the third-party identity provider
pub trait IdentityProviderClient: Send + Sync {
    /// Prepares the provider for the given OAuth client id
    fn initialize(&self, client_id: &str);

    /// Presents the sign-in affordance
    fn render_button(&self);

    /// Forgets any remembered session so the next sign-in is a fresh flow
    fn revoke_session(&self);
}

/// Observable state of a [`HeadlessProvider`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderState {
    pub client_id: Option<String>,
    pub initializations: u32,
    pub button_rendered: bool,
    pub auto_select_disabled: bool,
}

/// Provider for non-browser front-ends. The token arrives out of band
/// (environment or stdin), so this only tracks the sign-in surface state.
#[derive(Debug, Default)]
pub struct HeadlessProvider {
    state: Mutex<ProviderState>,
}

impl HeadlessProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> ProviderState {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ProviderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl IdentityProviderClient for HeadlessProvider {
    fn initialize(&self, client_id: &str) {
        let mut state = self.lock();
        state.client_id = Some(client_id.to_string());
        state.initializations += 1;
        state.button_rendered = false;
        debug!(client_id, "Identity provider initialized");
    }

    fn render_button(&self) {
        self.lock().button_rendered = true;
        info!("Waiting for a Google ID token");
    }

    fn revoke_session(&self) {
        let mut state = self.lock();
        state.auto_select_disabled = true;
        state.button_rendered = false;
        debug!("Identity provider auto-select disabled");
    }
}
