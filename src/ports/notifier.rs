//! Notification port.
//!
//! Notifications are best-effort by contract: callers log failures and
//! continue. An implementation must never be able to fail a webhook
//! response.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::donation::Donation;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification send failed: {0}")]
    Send(String),
}

#[async_trait]
pub trait DonationNotifier: Send + Sync {
    /// Receipt to the donor. Callers skip this when the donor email is
    /// the sentinel.
    async fn send_receipt(&self, donation: &Donation) -> Result<(), NotifyError>;

    /// Alert to the configured admin address, if any.
    async fn send_admin_alert(&self, donation: &Donation) -> Result<(), NotifyError>;
}
