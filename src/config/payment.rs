//! Payment configuration (Stripe)
//!
//! Credentials are optional: the service boots and serves requests
//! without them, and payment operations fail individually until keys are
//! configured. Validation only checks the shape of keys that are present.

use secrecy::SecretString;
use serde::Deserialize;

use super::error::ValidationError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentConfig {
    /// Stripe API key (sk_test_... / sk_live_...)
    #[serde(default)]
    pub stripe_api_key: String,

    /// Stripe webhook signing secret (whsec_...)
    #[serde(default)]
    pub stripe_webhook_secret: String,
}

impl PaymentConfig {
    /// API key as a secret, `None` when unset.
    pub fn api_key(&self) -> Option<SecretString> {
        (!self.stripe_api_key.is_empty())
            .then(|| SecretString::new(self.stripe_api_key.clone()))
    }

    /// Webhook signing secret, `None` when unset.
    pub fn webhook_secret(&self) -> Option<SecretString> {
        (!self.stripe_webhook_secret.is_empty())
            .then(|| SecretString::new(self.stripe_webhook_secret.clone()))
    }

    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_test_")
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.stripe_api_key.is_empty() && !self.stripe_api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !self.stripe_webhook_secret.is_empty()
            && !self.stripe_webhook_secret.starts_with("whsec_")
        {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }
        Ok(())
    }
}
