//! Ports: async trait boundaries between the application core and the
//! outside world.

pub mod donation_repository;
pub mod notifier;
pub mod payment_gateway;

pub use donation_repository::{DonationRepository, InsertOutcome, RepositoryError};
pub use notifier::{DonationNotifier, NotifyError};
pub use payment_gateway::{
    GatewayCustomer, PaymentError, PaymentGateway, PaymentIntentRequest, PaymentIntentSecret,
    SubscriptionPayment,
};
