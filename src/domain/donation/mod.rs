//! Donation domain: the record itself, the Stripe event envelope, and the
//! pure pieces of the webhook pipeline (signature verification and event
//! classification).

pub mod classifier;
pub mod donation;
pub mod errors;
pub mod signature;
pub mod stripe_event;
pub mod webhook_errors;

pub use classifier::{classify, Classification, SkipReason};
pub use donation::{
    Donation, DonationFrequency, DonationStatus, DonorIdentity, NewDonation,
    SENTINEL_DONOR_EMAIL, SENTINEL_DONOR_NAME,
};
pub use errors::DonationError;
pub use signature::{SignatureHeader, StripeWebhookVerifier};
pub use stripe_event::{Expandable, InvoiceObject, ObjectRef, PaymentIntentObject, StripeEvent};
pub use webhook_errors::WebhookError;
