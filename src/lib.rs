//! Temple Seva donation backend.
//!
//! Accepts Stripe webhook deliveries, converts recognized payment events
//! into exactly-once donation records, and originates the payment intents
//! and subscriptions those events settle.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
