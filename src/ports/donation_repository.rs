//! Persistence port for donation records.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::donation::Donation;

/// What happened when a donation was offered for insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new row was written.
    Inserted,
    /// A row with the same payment reference already exists. Benign;
    /// the delivery was a replay or a concurrent duplicate.
    AlreadyRecorded,
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(String),
}

/// Store of donation records. Implementations must enforce uniqueness of
/// `stripe_payment_id` atomically at write time; callers never pre-check.
#[async_trait]
pub trait DonationRepository: Send + Sync {
    /// Insert the donation unless its payment reference is already
    /// recorded.
    async fn insert(&self, donation: &Donation) -> Result<InsertOutcome, RepositoryError>;

    /// Look up a donation by its Stripe payment reference.
    async fn find_by_payment_id(
        &self,
        stripe_payment_id: &str,
    ) -> Result<Option<Donation>, RepositoryError>;
}
