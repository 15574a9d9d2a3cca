//! One-time donation intent creation.

use std::sync::Arc;

use tracing::info;

use crate::domain::donation::{DonationError, DonorIdentity};
use crate::ports::{PaymentGateway, PaymentIntentRequest};

/// Smallest accepted donation, in minor currency units.
const MIN_AMOUNT: i64 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDonationIntentCommand {
    pub amount: i64,
    pub currency: String,
    pub donor_email: Option<String>,
    pub donor_name: Option<String>,
}

pub struct CreateDonationIntentHandler {
    gateway: Arc<dyn PaymentGateway>,
}

impl CreateDonationIntentHandler {
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { gateway }
    }

    /// Validate and create a payment intent, returning its client secret.
    ///
    /// Validation happens before any provider call; an invalid request
    /// never reaches the network.
    pub async fn handle(
        &self,
        command: CreateDonationIntentCommand,
    ) -> Result<String, DonationError> {
        if command.amount < MIN_AMOUNT {
            return Err(DonationError::validation(
                "amount",
                format!("must be at least {MIN_AMOUNT} minor units"),
            ));
        }
        if command.currency.len() != 3
            || !command.currency.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(DonationError::validation(
                "currency",
                "must be a 3-letter ISO code",
            ));
        }

        let donor = match (&command.donor_name, &command.donor_email) {
            (None, None) => None,
            (name, email) => Some(DonorIdentity::from_metadata(
                name.as_deref(),
                email.as_deref(),
            )),
        };

        let secret = self
            .gateway
            .create_payment_intent(PaymentIntentRequest {
                amount: command.amount,
                currency: command.currency.to_lowercase(),
                donor,
            })
            .await
            .map_err(|e| DonationError::IntentCreationFailed(e.to_string()))?;

        let client_secret = secret.client_secret.ok_or_else(|| {
            DonationError::IntentCreationFailed(
                "provider returned no client secret".to_string(),
            )
        })?;

        info!(amount = command.amount, "donation intent created");
        Ok(client_secret)
    }
}
