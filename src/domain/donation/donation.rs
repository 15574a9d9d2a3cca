//! The donation record and its value types.
//!
//! A `Donation` is the canonical record of a recognized, completed payment.
//! It is created exactly once per Stripe payment reference and never
//! updated or deleted by this service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fallback donor email when no identity reached us through metadata.
pub const SENTINEL_DONOR_EMAIL: &str = "donor@unknown";

/// Fallback donor display name.
pub const SENTINEL_DONOR_NAME: &str = "Donor";

/// How often the donation recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DonationFrequency {
    /// Single payment via a payment intent.
    OneTime,
    /// Recurring monthly payment via a subscription invoice.
    Monthly,
}

impl DonationFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneTime => "ONE_TIME",
            Self::Monthly => "MONTHLY",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ONE_TIME" => Some(Self::OneTime),
            "MONTHLY" => Some(Self::Monthly),
            _ => None,
        }
    }
}

/// Lifecycle status of a donation.
///
/// Only `Succeeded` is ever written by the webhook pipeline; the variant
/// exists so the column is not a bare string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DonationStatus {
    Succeeded,
}

impl DonationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "succeeded" => Some(Self::Succeeded),
            _ => None,
        }
    }
}

/// Donor name/email pair carried through Stripe metadata.
///
/// The pair is optional end to end: intent creation may attach it as
/// metadata, and webhook extraction reads it back out. When it is absent
/// at recording time the documented sentinel values are used instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonorIdentity {
    pub name: String,
    pub email: String,
}

impl DonorIdentity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// The sentinel identity used when no donor information is available.
    pub fn unknown() -> Self {
        Self {
            name: SENTINEL_DONOR_NAME.to_string(),
            email: SENTINEL_DONOR_EMAIL.to_string(),
        }
    }

    /// Build from optional metadata values, falling back per field.
    pub fn from_metadata(name: Option<&str>, email: Option<&str>) -> Self {
        Self {
            name: name
                .filter(|s| !s.is_empty())
                .unwrap_or(SENTINEL_DONOR_NAME)
                .to_string(),
            email: email
                .filter(|s| !s.is_empty())
                .unwrap_or(SENTINEL_DONOR_EMAIL)
                .to_string(),
        }
    }

    /// True when the email is the sentinel, i.e. no receipt can be sent.
    pub fn is_unknown_email(&self) -> bool {
        self.email == SENTINEL_DONOR_EMAIL
    }
}

/// A donation ready to be recorded, before an id and timestamp exist.
///
/// Produced by the event classifier; consumed by the repository insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDonation {
    /// Amount in minor currency units (cents).
    pub amount: i64,
    pub donor: DonorIdentity,
    pub frequency: DonationFrequency,
    /// Stripe payment-intent identifier; unique per donation for the
    /// lifetime of the system.
    pub stripe_payment_id: String,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
}

/// A recorded donation row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donation {
    pub id: Uuid,
    pub amount: i64,
    pub donor_name: String,
    pub donor_email: String,
    pub frequency: DonationFrequency,
    pub status: DonationStatus,
    pub stripe_payment_id: String,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Donation {
    /// Materialize a new row from classifier output.
    pub fn record(new: NewDonation) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount: new.amount,
            donor_name: new.donor.name,
            donor_email: new.donor.email,
            frequency: new.frequency,
            status: DonationStatus::Succeeded,
            stripe_payment_id: new.stripe_payment_id,
            stripe_customer_id: new.stripe_customer_id,
            stripe_subscription_id: new.stripe_subscription_id,
            created_at: Utc::now(),
        }
    }

    /// True when a receipt email should be attempted for this donation.
    pub fn has_reachable_donor(&self) -> bool {
        self.donor_email != SENTINEL_DONOR_EMAIL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_roundtrip() {
        for f in [DonationFrequency::OneTime, DonationFrequency::Monthly] {
            assert_eq!(DonationFrequency::parse(f.as_str()), Some(f));
        }
        assert_eq!(DonationFrequency::parse("WEEKLY"), None);
    }

    #[test]
    fn status_roundtrip() {
        assert_eq!(
            DonationStatus::parse(DonationStatus::Succeeded.as_str()),
            Some(DonationStatus::Succeeded)
        );
        assert_eq!(DonationStatus::parse("pending"), None);
    }

    #[test]
    fn donor_identity_from_full_metadata() {
        let donor = DonorIdentity::from_metadata(Some("A"), Some("a@x.com"));
        assert_eq!(donor.name, "A");
        assert_eq!(donor.email, "a@x.com");
        assert!(!donor.is_unknown_email());
    }

    #[test]
    fn donor_identity_falls_back_per_field() {
        let donor = DonorIdentity::from_metadata(Some("A"), None);
        assert_eq!(donor.name, "A");
        assert_eq!(donor.email, SENTINEL_DONOR_EMAIL);

        let donor = DonorIdentity::from_metadata(None, Some("a@x.com"));
        assert_eq!(donor.name, SENTINEL_DONOR_NAME);
        assert_eq!(donor.email, "a@x.com");
    }

    #[test]
    fn donor_identity_treats_empty_strings_as_absent() {
        let donor = DonorIdentity::from_metadata(Some(""), Some(""));
        assert_eq!(donor, DonorIdentity::unknown());
    }

    #[test]
    fn record_assigns_id_and_succeeded_status() {
        let donation = Donation::record(NewDonation {
            amount: 2500,
            donor: DonorIdentity::new("A", "a@x.com"),
            frequency: DonationFrequency::OneTime,
            stripe_payment_id: "pi_1".to_string(),
            stripe_customer_id: None,
            stripe_subscription_id: None,
        });

        assert_eq!(donation.amount, 2500);
        assert_eq!(donation.status, DonationStatus::Succeeded);
        assert_eq!(donation.stripe_payment_id, "pi_1");
        assert!(donation.has_reachable_donor());
    }

    #[test]
    fn sentinel_donor_is_not_reachable() {
        let donation = Donation::record(NewDonation {
            amount: 1000,
            donor: DonorIdentity::unknown(),
            frequency: DonationFrequency::Monthly,
            stripe_payment_id: "pi_2".to_string(),
            stripe_customer_id: Some("cus_1".to_string()),
            stripe_subscription_id: Some("sub_1".to_string()),
        });

        assert!(!donation.has_reachable_donor());
    }
}
