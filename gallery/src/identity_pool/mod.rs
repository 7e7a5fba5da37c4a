//! Exchange of a third-party identity token for temporary AWS credentials

mod error;

use std::fmt;

use aws_sdk_cognitoidentity::Client as CognitoClient;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

pub use error::{IdentityPoolError, IdentityPoolResult};

/// Temporary credentials scoped to a federated identity
#[derive(Clone, PartialEq, Eq)]
pub struct FederatedCredentials {
    pub identity_id: String,
    pub access_key_id: String,
    pub secret_key: String,
    pub session_token: String,
    pub expiration: DateTime<Utc>,
}

impl fmt::Debug for FederatedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FederatedCredentials")
            .field("identity_id", &self.identity_id)
            .field("access_key_id", &self.access_key_id)
            .field("secret_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Identity-pool exchange operation
#[async_trait::async_trait]
pub trait IdentityPoolClient: Send + Sync {
    /// Exchanges `token`, issued by the provider named `provider_key`, for credentials
    /// of the federated identity it maps to in `pool_id`.
    async fn exchange(
        &self,
        pool_id: &str,
        provider_key: &str,
        token: &str,
    ) -> IdentityPoolResult<FederatedCredentials>;
}

/// Cognito identity pool backed exchange (`GetId` + `GetCredentialsForIdentity`)
pub struct CognitoIdentityPool {
    client: CognitoClient,
}

impl CognitoIdentityPool {
    #[must_use]
    pub const fn new(client: CognitoClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl IdentityPoolClient for CognitoIdentityPool {
    async fn exchange(
        &self,
        pool_id: &str,
        provider_key: &str,
        token: &str,
    ) -> IdentityPoolResult<FederatedCredentials> {
        let id_output = self
            .client
            .get_id()
            .identity_pool_id(pool_id)
            .logins(provider_key, token)
            .send()
            .await?;

        let identity_id = id_output
            .identity_id()
            .ok_or(IdentityPoolError::IncompleteResponse("identity id"))?
            .to_string();

        debug!(identity_id = %identity_id, "Resolved federated identity");

        let output = self
            .client
            .get_credentials_for_identity()
            .identity_id(&identity_id)
            .logins(provider_key, token)
            .send()
            .await?;

        let credentials = output
            .credentials()
            .ok_or(IdentityPoolError::IncompleteResponse("credentials"))?;

        let expiration = credentials
            .expiration()
            .and_then(|dt| DateTime::from_timestamp(dt.secs(), dt.subsec_nanos()))
            .ok_or(IdentityPoolError::IncompleteResponse("expiration"))?;

        let field = |value: Option<&str>, name: &'static str| {
            value
                .map(ToString::to_string)
                .ok_or(IdentityPoolError::IncompleteResponse(name))
        };

        let credentials = FederatedCredentials {
            identity_id: output
                .identity_id()
                .map_or(identity_id, ToString::to_string),
            access_key_id: field(credentials.access_key_id(), "access key id")?,
            secret_key: field(credentials.secret_key(), "secret key")?,
            session_token: field(credentials.session_token(), "session token")?,
            expiration,
        };

        info!(
            identity_id = %credentials.identity_id,
            expires_at = %credentials.expiration,
            "Obtained temporary credentials"
        );

        Ok(credentials)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use chrono::{Duration, Utc};
    use tokio::sync::Notify;

    use super::{FederatedCredentials, IdentityPoolClient, IdentityPoolError, IdentityPoolResult};

    /// One scripted answer, optionally held back until `gate` is notified
    pub struct ScriptedExchange {
        pub outcome: IdentityPoolResult<FederatedCredentials>,
        pub gate: Option<Arc<Notify>>,
    }

    impl ScriptedExchange {
        #[must_use]
        pub fn ok(identity_id: &str) -> Self {
            Self {
                outcome: Ok(MockIdentityPool::credentials_for(identity_id)),
                gate: None,
            }
        }

        #[must_use]
        pub fn rejected(message: &str) -> Self {
            Self {
                outcome: Err(IdentityPoolError::Rejected(message.to_string())),
                gate: None,
            }
        }

        #[must_use]
        pub fn gated(mut self, gate: Arc<Notify>) -> Self {
            self.gate = Some(gate);
            self
        }
    }

    /// A recorded call to `exchange`
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedExchange {
        pub pool_id: String,
        pub provider_key: String,
        pub token: String,
    }

    /// Identity pool that replays scripted answers and records every call.
    /// With nothing scripted, every exchange succeeds as `us-east-1:mock-identity`.
    #[derive(Default)]
    pub struct MockIdentityPool {
        scripted: Mutex<VecDeque<ScriptedExchange>>,
        calls: Mutex<Vec<RecordedExchange>>,
    }

    impl MockIdentityPool {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push(&self, exchange: ScriptedExchange) {
            self.scripted
                .lock()
                .expect("mock lock poisoned")
                .push_back(exchange);
        }

        #[must_use]
        pub fn calls(&self) -> Vec<RecordedExchange> {
            self.calls.lock().expect("mock lock poisoned").clone()
        }

        /// Credentials valid for one hour
        #[must_use]
        pub fn credentials_for(identity_id: &str) -> FederatedCredentials {
            FederatedCredentials {
                identity_id: identity_id.to_string(),
                access_key_id: "ASIAMOCKACCESSKEY".to_string(),
                secret_key: "mock-secret-key".to_string(),
                session_token: "mock-session-token".to_string(),
                expiration: Utc::now() + Duration::hours(1),
            }
        }
    }

    #[async_trait::async_trait]
    impl IdentityPoolClient for MockIdentityPool {
        async fn exchange(
            &self,
            pool_id: &str,
            provider_key: &str,
            token: &str,
        ) -> IdentityPoolResult<FederatedCredentials> {
            self.calls
                .lock()
                .expect("mock lock poisoned")
                .push(RecordedExchange {
                    pool_id: pool_id.to_string(),
                    provider_key: provider_key.to_string(),
                    token: token.to_string(),
                });

            let scripted = self
                .scripted
                .lock()
                .expect("mock lock poisoned")
                .pop_front()
                .unwrap_or_else(|| ScriptedExchange::ok("us-east-1:mock-identity"));

            if let Some(gate) = scripted.gate {
                gate.notified().await;
            }

            scripted.outcome
        }
    }
}
