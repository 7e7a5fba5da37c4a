mod config;
mod environment;
mod error;

pub use config::{AppConfig, GOOGLE_PROVIDER_KEY, PETS_PREFIX, SIGNED_URL_EXPIRY};
pub use environment::Environment;
pub use error::{ConfigError, GalleryError};
