//! UI controller: turns sign-in events into view updates

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use common_types::{GalleryView, ViewState};
use tracing::{debug, info};

use crate::identity_pool::IdentityPoolClient;
use crate::identity_provider::IdentityProviderClient;
use crate::media_storage::{Listing, ObjectStoreConnector};
use crate::session::{SessionManager, SessionState};
use crate::types::{AppConfig, ConfigError, GalleryError};

/// The signed-in gallery page, independent of any rendering technology.
///
/// Every failure is reported (log entry) and written inline into the view; nothing
/// propagates to the caller. Completions that belong to a superseded sign-in are
/// dropped without touching the view.
pub struct GalleryApp {
    sessions: SessionManager,
    identity_provider: Arc<dyn IdentityProviderClient>,
    connector: Arc<dyn ObjectStoreConnector>,
    view: Mutex<ViewState>,
}

impl GalleryApp {
    /// Wires the application together
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if any configuration field is blank
    pub fn new(
        config: AppConfig,
        identity_pool: Arc<dyn IdentityPoolClient>,
        identity_provider: Arc<dyn IdentityProviderClient>,
        connector: Arc<dyn ObjectStoreConnector>,
    ) -> Result<Self, ConfigError> {
        let sessions = SessionManager::new(config, identity_pool, identity_provider.clone())?;

        Ok(Self {
            sessions,
            identity_provider,
            connector,
            view: Mutex::new(ViewState::signed_out()),
        })
    }

    #[must_use]
    pub const fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Snapshot of what should currently be rendered
    #[must_use]
    pub fn view(&self) -> ViewState {
        self.lock_view().clone()
    }

    /// Page load: initialize the provider and offer sign-in
    pub fn start(&self) -> ViewState {
        self.identity_provider
            .initialize(&self.sessions.config().google_client_id);
        self.identity_provider.render_button();

        let mut view = self.lock_view();
        *view = ViewState::signed_out();
        view.clone()
    }

    /// Sign-in completion: exchange the token, then load the gallery
    pub async fn on_credential(&self, token: &str) -> ViewState {
        debug!("Google credential response received");

        match self.sessions.authenticate(token).await {
            Ok(session) => {
                {
                    let mut view = self.lock_view();
                    view.status_line = format!("Signed in as: {}", session.display_name());
                    view.sign_out_visible = true;
                }
                self.load_gallery().await
            }
            Err(GalleryError::Superseded) => {
                GalleryError::Superseded.report();
                self.view()
            }
            Err(err) => {
                err.report();
                let mut view = self.lock_view();
                if self.sessions.state() == SessionState::SignedOut {
                    *view = ViewState::signed_out();
                }
                view.status_line = err.user_message();
                view.clone()
            }
        }
    }

    /// Reloads the gallery area for the active session
    pub async fn load_gallery(&self) -> ViewState {
        self.lock_view().gallery = GalleryView::Loading;

        let gallery = match self.sessions.list_gallery(self.connector.as_ref()).await {
            Ok(Listing::Images(items)) => GalleryView::Images(items),
            Ok(Listing::Empty(reason)) => {
                info!(reason = %reason, "Gallery is empty");
                GalleryView::Message(reason.message().to_string())
            }
            Err(GalleryError::Superseded) => {
                GalleryError::Superseded.report();
                return self.view();
            }
            Err(err @ (GalleryError::NotSignedIn | GalleryError::SessionExpired(_))) => {
                err.report();
                let mut view = self.lock_view();
                *view = ViewState::signed_out();
                view.status_line = err.user_message();
                return view.clone();
            }
            Err(err) => {
                err.report();
                GalleryView::Message(err.user_message())
            }
        };

        let mut view = self.lock_view();
        info!(gallery = %gallery, "Gallery updated");
        view.gallery = gallery;
        view.clone()
    }

    /// Sign-out: drop the session and reset the page
    pub fn sign_out(&self) -> ViewState {
        self.sessions.sign_out();

        let mut view = self.lock_view();
        *view = ViewState::signed_out();
        view.clone()
    }

    fn lock_view(&self) -> MutexGuard<'_, ViewState> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
