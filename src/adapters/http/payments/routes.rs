//! Route table for the payments API.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{self, PaymentsState};

/// All routes served by this service.
pub fn router(state: PaymentsState) -> Router {
    Router::new()
        .route("/webhooks/stripe", post(handlers::stripe_webhook))
        .route(
            "/api/v1/payments/donation-intent",
            post(handlers::create_donation_intent),
        )
        .route(
            "/api/v1/payments/subscription",
            post(handlers::create_subscription),
        )
        .route("/health", get(handlers::health))
        .with_state(state)
}
