//! Recurring donation subscription setup.

use std::sync::Arc;

use tracing::info;

use crate::domain::donation::DonationError;
use crate::ports::{GatewayCustomer, PaymentGateway};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSubscriptionCommand {
    pub plan_id: String,
    pub email: String,
    pub name: String,
}

/// What the client needs to confirm the first subscription payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionCreated {
    pub subscription_id: String,
    pub client_secret: String,
}

pub struct CreateSubscriptionHandler {
    gateway: Arc<dyn PaymentGateway>,
}

impl CreateSubscriptionHandler {
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { gateway }
    }

    pub async fn handle(
        &self,
        command: CreateSubscriptionCommand,
    ) -> Result<SubscriptionCreated, DonationError> {
        if command.plan_id.trim().is_empty() {
            return Err(DonationError::validation("planId", "must not be empty"));
        }
        if command.email.trim().is_empty() || !command.email.contains('@') {
            return Err(DonationError::validation(
                "email",
                "must be a valid email address",
            ));
        }
        if command.name.trim().is_empty() {
            return Err(DonationError::validation("name", "must not be empty"));
        }

        let customer = self.find_or_create_customer(&command).await?;

        let payment = self
            .gateway
            .create_subscription(&customer.id, &command.plan_id)
            .await
            .map_err(|e| DonationError::Gateway(e.to_string()))?;

        let client_secret = payment.client_secret.ok_or_else(|| {
            DonationError::SubscriptionPaymentUnavailable(
                "no payment intent secret on the first invoice".to_string(),
            )
        })?;

        info!(
            subscription_id = %payment.subscription_id,
            customer_id = %customer.id,
            plan_id = %command.plan_id,
            "subscription created"
        );

        Ok(SubscriptionCreated {
            subscription_id: payment.subscription_id,
            client_secret,
        })
    }

    /// Reuse the first customer matching the email, creating one only
    /// when none exists.
    async fn find_or_create_customer(
        &self,
        command: &CreateSubscriptionCommand,
    ) -> Result<GatewayCustomer, DonationError> {
        let existing = self
            .gateway
            .find_customer_by_email(&command.email)
            .await
            .map_err(|e| DonationError::Gateway(e.to_string()))?;

        match existing {
            Some(customer) => Ok(customer),
            None => self
                .gateway
                .create_customer(&command.email, &command.name)
                .await
                .map_err(|e| DonationError::Gateway(e.to_string())),
        }
    }
}
