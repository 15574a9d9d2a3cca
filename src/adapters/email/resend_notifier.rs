//! Resend email notifier.
//!
//! Sends donation receipts and admin alerts through the Resend HTTP API.
//! Callers treat every send as best-effort; errors surface only as
//! `NotifyError` for the caller to log.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::domain::donation::Donation;
use crate::ports::{DonationNotifier, NotifyError};

const RESEND_API_URL: &str = "https://api.resend.com/emails";

#[derive(Clone)]
pub struct ResendConfig {
    /// Resend API key (re_...), if configured.
    pub api_key: Option<SecretString>,
    /// RFC 5322 From header, e.g. "Temple Seva <donations@temple.org>".
    pub from: String,
    /// Recipient for new-donation alerts; no alerts are sent when unset.
    pub admin_email: Option<String>,
}

pub struct ResendNotifier {
    config: ResendConfig,
    http_client: reqwest::Client,
    api_url: String,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: String,
    html: String,
}

impl ResendNotifier {
    pub fn new(config: ResendConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
            api_url: RESEND_API_URL.to_string(),
        }
    }

    /// Point at a different API endpoint (for testing).
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    async fn send(&self, request: &SendEmailRequest<'_>) -> Result<(), NotifyError> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| NotifyError::Send("RESEND_API_KEY is not configured".to_string()))?;

        let response = self
            .http_client
            .post(&self.api_url)
            .bearer_auth(api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|e| NotifyError::Send(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(NotifyError::Send(error_text));
        }
        Ok(())
    }

    fn format_amount(donation: &Donation) -> String {
        format!("{}.{:02}", donation.amount / 100, donation.amount % 100)
    }
}

#[async_trait]
impl DonationNotifier for ResendNotifier {
    async fn send_receipt(&self, donation: &Donation) -> Result<(), NotifyError> {
        let amount = Self::format_amount(donation);
        self.send(&SendEmailRequest {
            from: &self.config.from,
            to: vec![&donation.donor_email],
            subject: "Thank you for your donation".to_string(),
            html: format!(
                "<p>Dear {},</p><p>We gratefully acknowledge your {} donation of {}.</p>\
                 <p>Reference: {}</p>",
                donation.donor_name,
                match donation.frequency {
                    crate::domain::donation::DonationFrequency::OneTime => "one-time",
                    crate::domain::donation::DonationFrequency::Monthly => "monthly",
                },
                amount,
                donation.stripe_payment_id,
            ),
        })
        .await
    }

    async fn send_admin_alert(&self, donation: &Donation) -> Result<(), NotifyError> {
        let Some(admin_email) = self.config.admin_email.as_deref() else {
            return Ok(());
        };

        let amount = Self::format_amount(donation);
        self.send(&SendEmailRequest {
            from: &self.config.from,
            to: vec![admin_email],
            subject: format!("New donation: {amount}"),
            html: format!(
                "<p>{} ({}) donated {} [{}].</p><p>Payment: {}</p>",
                donation.donor_name,
                donation.donor_email,
                amount,
                donation.frequency.as_str(),
                donation.stripe_payment_id,
            ),
        })
        .await
    }
}
