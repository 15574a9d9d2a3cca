//! Stripe payment gateway adapter.
//!
//! Talks to the Stripe REST API with form-encoded requests. The API key
//! is optional at construction; every operation resolves it first and
//! fails with `MissingCredential` when it was never configured, so the
//! service can boot (and serve webhook rejections) without payment
//! credentials.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::domain::donation::Expandable;
use crate::ports::{
    GatewayCustomer, PaymentError, PaymentGateway, PaymentIntentRequest, PaymentIntentSecret,
    SubscriptionPayment,
};

use super::types::{
    StripeCustomer, StripeInvoice, StripeList, StripePaymentIntent, StripeSubscription,
};

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (sk_live_... or sk_test_...), if configured.
    api_key: Option<SecretString>,

    /// Base URL for the Stripe API (default: https://api.stripe.com).
    api_base_url: String,
}

impl StripeConfig {
    pub fn new(api_key: Option<SecretString>) -> Self {
        Self {
            api_key,
            api_base_url: "https://api.stripe.com".to_string(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

pub struct StripeGateway {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Resolve the API key, failing only at the moment it is needed.
    fn api_key(&self) -> Result<&SecretString, PaymentError> {
        self.config
            .api_key
            .as_ref()
            .ok_or(PaymentError::MissingCredential("STRIPE_API_KEY"))
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, PaymentError> {
        let key = self.api_key()?;
        let url = format!("{}{}", self.config.api_base_url, path);

        let response = self
            .http_client
            .post(&url)
            .basic_auth(key.expose_secret(), Option::<&str>::None)
            .form(params)
            .send()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        Self::read_json(response, path).await
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, PaymentError> {
        let key = self.api_key()?;
        let url = format!("{}{}", self.config.api_base_url, path);

        let response = self
            .http_client
            .get(&url)
            .basic_auth(key.expose_secret(), Option::<&str>::None)
            .query(query)
            .send()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        Self::read_json(response, path).await
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        path: &str,
    ) -> Result<T, PaymentError> {
        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(path, error = %error_text, "Stripe API call failed");
            return Err(PaymentError::Provider(error_text));
        }
        response
            .json()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))
    }

    /// Walk subscription -> latest invoice -> payment intent, following
    /// bare references with extra retrievals when Stripe did not expand
    /// them inline.
    async fn resolve_first_invoice_secret(
        &self,
        subscription: &StripeSubscription,
    ) -> Result<Option<String>, PaymentError> {
        let Some(invoice_ref) = subscription.latest_invoice.as_ref() else {
            return Ok(None);
        };

        let invoice: StripeInvoice = match invoice_ref {
            Expandable::Object(invoice) => (**invoice).clone(),
            Expandable::Id(id) => self.get(&format!("/v1/invoices/{id}"), &[]).await?,
        };

        let Some(intent_ref) = invoice.payment_intent.as_ref() else {
            return Ok(None);
        };

        let intent: StripePaymentIntent = match intent_ref {
            Expandable::Object(intent) => (**intent).clone(),
            Expandable::Id(id) => self.get(&format!("/v1/payment_intents/{id}"), &[]).await?,
        };

        Ok(intent.client_secret)
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntentSecret, PaymentError> {
        let mut params = vec![
            ("amount", request.amount.to_string()),
            ("currency", request.currency.clone()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
        ];
        if let Some(donor) = &request.donor {
            params.push(("metadata[donorEmail]", donor.email.clone()));
            params.push(("metadata[donorName]", donor.name.clone()));
        }

        let intent: StripePaymentIntent = self.post_form("/v1/payment_intents", &params).await?;

        Ok(PaymentIntentSecret {
            client_secret: intent.client_secret,
        })
    }

    async fn find_customer_by_email(
        &self,
        email: &str,
    ) -> Result<Option<GatewayCustomer>, PaymentError> {
        let list: StripeList<StripeCustomer> = self
            .get(
                "/v1/customers",
                &[("email", email.to_string()), ("limit", "1".to_string())],
            )
            .await?;

        Ok(list.data.into_iter().next().map(|c| GatewayCustomer {
            id: c.id,
            email: c.email,
            name: c.name,
        }))
    }

    async fn create_customer(
        &self,
        email: &str,
        name: &str,
    ) -> Result<GatewayCustomer, PaymentError> {
        let customer: StripeCustomer = self
            .post_form(
                "/v1/customers",
                &[("email", email.to_string()), ("name", name.to_string())],
            )
            .await?;

        Ok(GatewayCustomer {
            id: customer.id,
            email: customer.email,
            name: customer.name,
        })
    }

    async fn create_subscription(
        &self,
        customer_id: &str,
        price_id: &str,
    ) -> Result<SubscriptionPayment, PaymentError> {
        let subscription: StripeSubscription = self
            .post_form(
                "/v1/subscriptions",
                &[
                    ("customer", customer_id.to_string()),
                    ("items[0][price]", price_id.to_string()),
                    ("payment_behavior", "default_incomplete".to_string()),
                    ("expand[]", "latest_invoice.payment_intent".to_string()),
                ],
            )
            .await?;

        let client_secret = self.resolve_first_invoice_secret(&subscription).await?;

        Ok(SubscriptionPayment {
            subscription_id: subscription.id,
            client_secret,
        })
    }

    async fn get_customer(&self, customer_id: &str) -> Result<GatewayCustomer, PaymentError> {
        let customer: StripeCustomer =
            self.get(&format!("/v1/customers/{customer_id}"), &[]).await?;

        Ok(GatewayCustomer {
            id: customer.id,
            email: customer.email,
            name: customer.name,
        })
    }
}
