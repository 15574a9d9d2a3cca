//! Payment provider port.
//!
//! Abstracts the Stripe REST surface the service uses. Credentials are
//! resolved lazily by implementations: constructing a gateway without a
//! key must succeed, and every operation fails with
//! [`PaymentError::MissingCredential`] until one is configured.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::donation::DonorIdentity;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PaymentError {
    #[error("Payment credential {0} is not configured")]
    MissingCredential(&'static str),

    #[error("Payment provider request failed: {0}")]
    Network(String),

    #[error("Payment provider rejected the request: {0}")]
    Provider(String),

    #[error("Unexpected payment provider response: {0}")]
    Parse(String),
}

/// Request to create a one-time payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntentRequest {
    /// Amount in minor currency units.
    pub amount: i64,
    /// Lowercase ISO currency code.
    pub currency: String,
    /// Attached to the intent as metadata when present so the webhook
    /// can recover the donor later.
    pub donor: Option<DonorIdentity>,
}

/// Client-side confirmation handle for a payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntentSecret {
    pub client_secret: Option<String>,
}

/// A provider-side customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayCustomer {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

/// A created subscription plus its first-invoice confirmation secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionPayment {
    pub subscription_id: String,
    pub client_secret: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntentSecret, PaymentError>;

    /// First customer whose email matches, if any.
    async fn find_customer_by_email(
        &self,
        email: &str,
    ) -> Result<Option<GatewayCustomer>, PaymentError>;

    async fn create_customer(
        &self,
        email: &str,
        name: &str,
    ) -> Result<GatewayCustomer, PaymentError>;

    /// Create an incomplete subscription on the given plan and resolve
    /// the client secret of its first invoice's payment intent.
    async fn create_subscription(
        &self,
        customer_id: &str,
        price_id: &str,
    ) -> Result<SubscriptionPayment, PaymentError>;

    /// Retrieve a customer by id, used to attribute recurring donations.
    async fn get_customer(&self, customer_id: &str) -> Result<GatewayCustomer, PaymentError>;
}
