//! Stripe REST adapter.

pub mod gateway;
pub mod types;

pub use gateway::{StripeConfig, StripeGateway};
