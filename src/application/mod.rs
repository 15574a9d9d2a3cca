//! Application layer: command handlers orchestrating domain logic over
//! the ports.

pub mod create_donation_intent;
pub mod create_subscription;
pub mod process_webhook;

pub use create_donation_intent::{CreateDonationIntentCommand, CreateDonationIntentHandler};
pub use create_subscription::{
    CreateSubscriptionCommand, CreateSubscriptionHandler, SubscriptionCreated,
};
pub use process_webhook::{ProcessWebhookHandler, WebhookOutcome};
