//! Environment configuration for different deployment stages

use std::env;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion, Region};
use tracing::Level;

use super::ConfigError;

/// Application environment configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (uses `LocalStack`)
    Development,
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvironment` if `APP_ENV` holds an unknown value
    pub fn from_env() -> Result<Self, ConfigError> {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => Ok(Self::Development),
            _ => Err(ConfigError::InvalidEnvironment(env)),
        }
    }

    /// Whether logs should be emitted as JSON
    #[must_use]
    pub const fn json_logs(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }

    /// Returns the endpoint URL to use for AWS services
    #[must_use]
    pub const fn override_aws_endpoint_url(&self) -> Option<&str> {
        match self {
            Self::Production | Self::Staging => None,
            // LocalStack endpoint for development
            Self::Development => Some("http://localhost:4566"),
        }
    }

    /// AWS configuration for `region` with retry and timeout settings
    pub async fn aws_config(&self, region: &str) -> aws_config::SdkConfig {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(30))
            .build();

        let mut config_builder = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_owned()))
            .load()
            .await
            .to_builder()
            .retry_config(retry_config)
            .timeout_config(timeout_config);

        if let Some(endpoint_url) = self.override_aws_endpoint_url() {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }

        config_builder.build()
    }

    /// Base S3 service configuration; session credentials are layered on per sign-in
    pub async fn s3_client_config(&self, region: &str) -> aws_sdk_s3::Config {
        let aws_config = self.aws_config(region).await;
        let s3_config: aws_sdk_s3::Config = (&aws_config).into();
        let mut builder = s3_config.to_builder();

        // Override "force path style" to true for compatibility with LocalStack
        // https://github.com/awslabs/aws-sdk-rust/discussions/874
        if matches!(self, Self::Development) {
            builder.set_force_path_style(Some(true));
        }

        builder.build()
    }

    /// Default log level when `RUST_LOG` is not set
    #[must_use]
    pub fn tracing_level(&self) -> Level {
        env::var("TRACING_LEVEL")
            .ok()
            .and_then(|val| val.parse::<Level>().ok())
            .unwrap_or(match self {
                Self::Production | Self::Staging => Level::INFO,
                Self::Development => Level::DEBUG,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_environment_from_env() {
        env::remove_var("APP_ENV");
        assert_eq!(Environment::from_env().unwrap(), Environment::Development);

        env::set_var("APP_ENV", " Staging ");
        assert_eq!(Environment::from_env().unwrap(), Environment::Staging);

        env::set_var("APP_ENV", "production");
        assert_eq!(Environment::from_env().unwrap(), Environment::Production);

        env::remove_var("APP_ENV");
    }

    #[test]
    #[serial]
    fn test_invalid_environment() {
        env::set_var("APP_ENV", "invalid");
        let err = Environment::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvironment(ref v) if v == "invalid"));
        env::remove_var("APP_ENV");
    }

    #[test]
    fn test_endpoint_override_only_in_development() {
        assert_eq!(
            Environment::Development.override_aws_endpoint_url(),
            Some("http://localhost:4566")
        );
        assert_eq!(Environment::Production.override_aws_endpoint_url(), None);
        assert!(Environment::Staging.json_logs());
        assert!(!Environment::Development.json_logs());
    }

    #[test]
    #[serial]
    fn test_tracing_level_override() {
        env::remove_var("TRACING_LEVEL");
        assert_eq!(Environment::Production.tracing_level(), Level::INFO);
        assert_eq!(Environment::Development.tracing_level(), Level::DEBUG);

        env::set_var("TRACING_LEVEL", "warn");
        assert_eq!(Environment::Production.tracing_level(), Level::WARN);
        env::remove_var("TRACING_LEVEL");
    }
}
