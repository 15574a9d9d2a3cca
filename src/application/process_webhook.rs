//! Webhook ingestion command handler.
//!
//! Pipeline: verify the signature over the raw bytes, classify the event,
//! resolve the donor for recurring payments, insert idempotently, then
//! send best-effort notifications for newly recorded donations.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::donation::{
    classify, Classification, Donation, DonorIdentity, NewDonation, SkipReason,
    StripeWebhookVerifier, WebhookError,
};
use crate::ports::{DonationNotifier, DonationRepository, InsertOutcome, PaymentGateway};

/// Terminal state of one webhook delivery.
#[derive(Debug, Clone)]
pub enum WebhookOutcome {
    /// A new donation row was written.
    Recorded(Donation),
    /// The payment reference was already recorded; nothing changed.
    AlreadyRecorded,
    /// Verified but intentionally not recorded.
    Acknowledged(SkipReason),
}

pub struct ProcessWebhookHandler {
    verifier: StripeWebhookVerifier,
    repository: Arc<dyn DonationRepository>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn DonationNotifier>,
}

impl ProcessWebhookHandler {
    pub fn new(
        verifier: StripeWebhookVerifier,
        repository: Arc<dyn DonationRepository>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn DonationNotifier>,
    ) -> Self {
        Self {
            verifier,
            repository,
            gateway,
            notifier,
        }
    }

    pub async fn handle(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookOutcome, WebhookError> {
        let event = self.verifier.verify_and_parse(payload, signature_header)?;

        let draft = match classify(&event)? {
            Classification::OneTime(draft) => draft,
            Classification::Recurring(draft) => self.resolve_recurring_donor(draft).await,
            Classification::Skip(reason) => {
                info!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    reason = reason.as_str(),
                    "webhook event acknowledged without recording"
                );
                return Ok(WebhookOutcome::Acknowledged(reason));
            }
        };

        let donation = Donation::record(draft);
        match self
            .repository
            .insert(&donation)
            .await
            .map_err(|e| WebhookError::Database(e.to_string()))?
        {
            InsertOutcome::Inserted => {
                info!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    donation_id = %donation.id,
                    payment_id = %donation.stripe_payment_id,
                    amount = donation.amount,
                    "donation recorded"
                );
                self.notify(&donation).await;
                Ok(WebhookOutcome::Recorded(donation))
            }
            InsertOutcome::AlreadyRecorded => {
                info!(
                    event_id = %event.id,
                    payment_id = %donation.stripe_payment_id,
                    "duplicate delivery, donation already recorded"
                );
                Ok(WebhookOutcome::AlreadyRecorded)
            }
        }
    }

    /// Fill the donor identity from the provider's customer record. Any
    /// failure degrades to the sentinel identity; a recurring donation is
    /// never dropped because attribution failed.
    async fn resolve_recurring_donor(&self, mut draft: NewDonation) -> NewDonation {
        let Some(customer_id) = draft.stripe_customer_id.clone() else {
            return draft;
        };

        match self.gateway.get_customer(&customer_id).await {
            Ok(customer) => {
                draft.donor = DonorIdentity::from_metadata(
                    customer.name.as_deref(),
                    customer.email.as_deref(),
                );
            }
            Err(e) => {
                warn!(
                    customer_id = %customer_id,
                    error = %e,
                    "customer lookup failed, recording donation with unknown donor"
                );
            }
        }
        draft
    }

    /// Best effort, after the insert committed. Failures are logged and
    /// swallowed so they cannot turn a recorded donation into a retry.
    async fn notify(&self, donation: &Donation) {
        if donation.has_reachable_donor() {
            if let Err(e) = self.notifier.send_receipt(donation).await {
                warn!(donation_id = %donation.id, error = %e, "receipt email failed");
            }
        }
        if let Err(e) = self.notifier.send_admin_alert(donation).await {
            warn!(donation_id = %donation.id, error = %e, "admin alert failed");
        }
    }
}
