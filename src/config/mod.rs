//! Application configuration.
//!
//! Loaded from environment variables with the `TEMPLE_SEVA` prefix and
//! `__` section separators, e.g. `TEMPLE_SEVA__DATABASE__URL` or
//! `TEMPLE_SEVA__PAYMENT__STRIPE_API_KEY`. A `.env` file is read first
//! when present.

pub mod database;
pub mod email;
pub mod error;
pub mod payment;
pub mod server;

pub use database::DatabaseConfig;
pub use email::EmailConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub payment: PaymentConfig,

    #[serde(default)]
    pub email: EmailConfig,
}

impl AppConfig {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self, ConfigError> {
        // best effort; absence of a .env file is not an error
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("TEMPLE_SEVA")
                    .separator("__"),
            )
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Validate every section.
    ///
    /// Payment and email credentials are deliberately allowed to be
    /// absent; only malformed values fail here.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.payment.validate()?;
        self.email.validate()?;
        Ok(())
    }
}
