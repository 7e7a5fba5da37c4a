//! Deployment-produced settings the gallery needs before any sign-in

use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

use super::ConfigError;

/// Key prefix that holds the shareable images inside the private container
pub const PETS_PREFIX: &str = "private-data/pets/";

/// Lifetime of every signed retrieval URL
pub const SIGNED_URL_EXPIRY: Duration = Duration::from_secs(60);

/// Logins-map key naming the Google identity provider
pub const GOOGLE_PROVIDER_KEY: &str = "accounts.google.com";

/// Identity pool, client and container identifiers produced by the deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub identity_pool_id: String,
    pub google_client_id: String,
    pub private_bucket_name: String,
    pub region: String,
}

impl AppConfig {
    /// Reads `IDENTITY_POOL_ID`, `GOOGLE_CLIENT_ID`, `PRIVATE_BUCKET_NAME` and `AWS_REGION`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` naming the first unset or blank variable
    pub fn from_env() -> Result<Self, ConfigError> {
        let var = |name: &str| env::var(name).unwrap_or_default();

        let config = Self {
            identity_pool_id: var("IDENTITY_POOL_ID"),
            google_client_id: var("GOOGLE_CLIENT_ID"),
            private_bucket_name: var("PRIVATE_BUCKET_NAME"),
            region: var("AWS_REGION"),
        };
        config.validate()?;

        Ok(config)
    }

    /// Builds the config from a `cdk deploy --outputs-file` document
    ///
    /// The document maps stack names to their outputs; the first stack (by name)
    /// that exports `IdentityPoolId` is used.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::OutputsJson` if the document is not a stack-outputs map,
    /// `ConfigError::MissingOutput` if a required output is absent and
    /// `ConfigError::Missing` if an output is blank
    pub fn from_stack_outputs(json: &str) -> Result<Self, ConfigError> {
        let stacks: BTreeMap<String, BTreeMap<String, String>> = serde_json::from_str(json)?;

        let outputs = stacks
            .into_values()
            .find(|outputs| outputs.contains_key("IdentityPoolId"))
            .ok_or(ConfigError::MissingOutput("IdentityPoolId"))?;

        let output = |name: &'static str| {
            outputs
                .get(name)
                .cloned()
                .ok_or(ConfigError::MissingOutput(name))
        };

        let config = Self {
            identity_pool_id: output("IdentityPoolId")?,
            google_client_id: output("GoogleClientId")?,
            private_bucket_name: output("PrivateDataBucketName")?,
            region: output("Region")?,
        };
        config.validate()?;

        Ok(config)
    }

    /// Checks that every field is populated
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` naming the first blank field
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("identity_pool_id", &self.identity_pool_id),
            ("google_client_id", &self.google_client_id),
            ("private_bucket_name", &self.private_bucket_name),
            ("region", &self.region),
        ];

        match fields.into_iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(ConfigError::Missing(name)),
            None => Ok(()),
        }
    }
}
