//! Payments HTTP handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::application::{
    CreateDonationIntentCommand, CreateDonationIntentHandler, CreateSubscriptionCommand,
    CreateSubscriptionHandler, ProcessWebhookHandler,
};
use crate::domain::donation::{DonationError, WebhookError};

use super::dto::{
    DonationIntentRequest, DonationIntentResponse, ErrorResponse, SubscriptionRequest,
    SubscriptionResponse, WebhookAck,
};

/// Shared state for the payments routes.
#[derive(Clone)]
pub struct PaymentsState {
    pub webhook: Arc<ProcessWebhookHandler>,
    pub donation_intent: Arc<CreateDonationIntentHandler>,
    pub subscription: Arc<CreateSubscriptionHandler>,
}

/// `POST /webhooks/stripe`
///
/// Body must be the raw bytes Stripe signed; any re-serialization would
/// break verification. Every verified event is acknowledged with 200 so
/// Stripe stops redelivering; only persistence failures return 5xx.
pub async fn stripe_webhook(
    State(state): State<PaymentsState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if body.is_empty() {
        return webhook_error(WebhookError::MissingBody);
    }

    let Some(signature) = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
    else {
        return webhook_error(WebhookError::MissingSignatureHeader);
    };

    match state.webhook.handle(&body, signature).await {
        Ok(_) => (StatusCode::OK, Json(WebhookAck { received: true })).into_response(),
        Err(e) => webhook_error(e),
    }
}

fn webhook_error(error: WebhookError) -> Response {
    (
        error.status_code(),
        Json(ErrorResponse::new(error.to_string())),
    )
        .into_response()
}

/// `POST /api/v1/payments/donation-intent`
pub async fn create_donation_intent(
    State(state): State<PaymentsState>,
    Json(request): Json<DonationIntentRequest>,
) -> Response {
    let command = CreateDonationIntentCommand {
        amount: request.amount,
        currency: request.currency,
        donor_email: request.donor_email,
        donor_name: request.donor_name,
    };

    match state.donation_intent.handle(command).await {
        Ok(client_secret) => {
            (StatusCode::OK, Json(DonationIntentResponse { client_secret })).into_response()
        }
        Err(e) => donation_error(e),
    }
}

/// `POST /api/v1/payments/subscription`
pub async fn create_subscription(
    State(state): State<PaymentsState>,
    Json(request): Json<SubscriptionRequest>,
) -> Response {
    let command = CreateSubscriptionCommand {
        plan_id: request.plan_id,
        email: request.email,
        name: request.name,
    };

    match state.subscription.handle(command).await {
        Ok(created) => (
            StatusCode::CREATED,
            Json(SubscriptionResponse {
                subscription_id: created.subscription_id,
                client_secret: created.client_secret,
            }),
        )
            .into_response(),
        Err(e) => donation_error(e),
    }
}

fn donation_error(error: DonationError) -> Response {
    let status = error.status_code();
    // internal detail stays out of 5xx bodies
    let message = if status.is_server_error() {
        tracing::error!(error = %error, "payment operation failed");
        match &error {
            DonationError::IntentCreationFailed(_) => "Payment intent creation failed",
            DonationError::SubscriptionPaymentUnavailable(_) => {
                "Subscription payment could not be initialized"
            }
            _ => "Payment processing failed",
        }
        .to_string()
    } else {
        error.to_string()
    };
    (status, Json(ErrorResponse::new(message))).into_response()
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}
