//! End-to-end tests for the payment-event ingestion pipeline.
//!
//! Drives the real axum router with signed webhook payloads and
//! in-memory implementations of the ports, verifying:
//! 1. Signature verification gates every delivery
//! 2. Classification (one-time, recurring, skips) matches the event shape
//! 3. Recording is idempotent across redeliveries
//! 4. Response codes and bodies follow the webhook contract

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use secrecy::SecretString;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use temple_seva::adapters::http::payments::{self, PaymentsState};
use temple_seva::application::{
    CreateDonationIntentHandler, CreateSubscriptionHandler, ProcessWebhookHandler,
};
use temple_seva::domain::donation::{
    signature::compute_test_signature, Donation, DonationFrequency, StripeWebhookVerifier,
};
use temple_seva::ports::{
    DonationNotifier, DonationRepository, GatewayCustomer, InsertOutcome, NotifyError,
    PaymentError, PaymentGateway, PaymentIntentRequest, PaymentIntentSecret, RepositoryError,
    SubscriptionPayment,
};

const SECRET: &str = "whsec_pipeline_test";

// =============================================================================
// In-memory ports
// =============================================================================

#[derive(Default)]
struct InMemoryRepository {
    rows: Mutex<Vec<Donation>>,
}

#[async_trait]
impl DonationRepository for InMemoryRepository {
    async fn insert(&self, donation: &Donation) -> Result<InsertOutcome, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|d| d.stripe_payment_id == donation.stripe_payment_id)
        {
            return Ok(InsertOutcome::AlreadyRecorded);
        }
        rows.push(donation.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn find_by_payment_id(
        &self,
        stripe_payment_id: &str,
    ) -> Result<Option<Donation>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.stripe_payment_id == stripe_payment_id)
            .cloned())
    }
}

#[derive(Default)]
struct InMemoryGateway {
    customers: Mutex<Vec<GatewayCustomer>>,
    intent_requests: Mutex<Vec<PaymentIntentRequest>>,
    subscription_requests: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl PaymentGateway for InMemoryGateway {
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntentSecret, PaymentError> {
        self.intent_requests.lock().unwrap().push(request);
        Ok(PaymentIntentSecret {
            client_secret: Some("pi_new_secret_x".to_string()),
        })
    }

    async fn find_customer_by_email(
        &self,
        email: &str,
    ) -> Result<Option<GatewayCustomer>, PaymentError> {
        Ok(self
            .customers
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.email.as_deref() == Some(email))
            .cloned())
    }

    async fn create_customer(
        &self,
        email: &str,
        name: &str,
    ) -> Result<GatewayCustomer, PaymentError> {
        let customer = GatewayCustomer {
            id: format!("cus_{}", self.customers.lock().unwrap().len() + 1),
            email: Some(email.to_string()),
            name: Some(name.to_string()),
        };
        self.customers.lock().unwrap().push(customer.clone());
        Ok(customer)
    }

    async fn create_subscription(
        &self,
        customer_id: &str,
        price_id: &str,
    ) -> Result<SubscriptionPayment, PaymentError> {
        self.subscription_requests
            .lock()
            .unwrap()
            .push((customer_id.to_string(), price_id.to_string()));
        Ok(SubscriptionPayment {
            subscription_id: "sub_new".to_string(),
            client_secret: Some("pi_sub_secret_x".to_string()),
        })
    }

    async fn get_customer(&self, customer_id: &str) -> Result<GatewayCustomer, PaymentError> {
        self.customers
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == customer_id)
            .cloned()
            .ok_or_else(|| PaymentError::Provider("no such customer".to_string()))
    }
}

#[derive(Default)]
struct InMemoryNotifier {
    receipts: Mutex<Vec<String>>,
}

#[async_trait]
impl DonationNotifier for InMemoryNotifier {
    async fn send_receipt(&self, donation: &Donation) -> Result<(), NotifyError> {
        self.receipts
            .lock()
            .unwrap()
            .push(donation.donor_email.clone());
        Ok(())
    }

    async fn send_admin_alert(&self, _donation: &Donation) -> Result<(), NotifyError> {
        Ok(())
    }
}

struct App {
    router: Router,
    repository: Arc<InMemoryRepository>,
    gateway: Arc<InMemoryGateway>,
    notifier: Arc<InMemoryNotifier>,
}

fn app() -> App {
    let repository = Arc::new(InMemoryRepository::default());
    let gateway = Arc::new(InMemoryGateway::default());
    let notifier = Arc::new(InMemoryNotifier::default());

    let verifier = StripeWebhookVerifier::new(Some(SecretString::new(SECRET.to_string())));
    let state = PaymentsState {
        webhook: Arc::new(ProcessWebhookHandler::new(
            verifier,
            repository.clone(),
            gateway.clone(),
            notifier.clone(),
        )),
        donation_intent: Arc::new(CreateDonationIntentHandler::new(gateway.clone())),
        subscription: Arc::new(CreateSubscriptionHandler::new(gateway.clone())),
    };

    App {
        router: payments::router(state),
        repository,
        gateway,
        notifier,
    }
}

fn event_json(event_type: &str, object: Value) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": "evt_test",
        "type": event_type,
        "created": Utc::now().timestamp(),
        "livemode": false,
        "data": { "object": object },
    }))
    .unwrap()
}

async fn post_webhook(router: &Router, payload: Vec<u8>, header: Option<String>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhooks/stripe")
        .header("content-type", "application/json");
    if let Some(header) = header {
        builder = builder.header("Stripe-Signature", header);
    }
    let response = router
        .clone()
        .oneshot(builder.body(Body::from(payload)).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn post_signed(router: &Router, payload: Vec<u8>) -> (StatusCode, Value) {
    let header = compute_test_signature(SECRET, Utc::now().timestamp(), &payload);
    post_webhook(router, payload, Some(header)).await
}

async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// =============================================================================
// Webhook ingestion
// =============================================================================

#[tokio::test]
async fn one_time_payment_records_a_donation() {
    let app = app();
    let payload = event_json(
        "payment_intent.succeeded",
        json!({
            "id": "pi_1",
            "amount": 2500,
            "metadata": { "donorEmail": "a@x.com", "donorName": "A" }
        }),
    );

    let (status, body) = post_signed(&app.router, payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "received": true }));

    let rows = app.repository.rows.lock().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].amount, 2500);
    assert_eq!(rows[0].frequency, DonationFrequency::OneTime);
    assert_eq!(rows[0].donor_email, "a@x.com");
    assert_eq!(rows[0].stripe_payment_id, "pi_1");

    assert_eq!(*app.notifier.receipts.lock().unwrap(), vec!["a@x.com"]);
}

#[tokio::test]
async fn redelivered_event_is_acknowledged_but_not_rerecorded() {
    let app = app();
    let payload = event_json(
        "payment_intent.succeeded",
        json!({ "id": "pi_1", "amount": 2500 }),
    );

    let (first, _) = post_signed(&app.router, payload.clone()).await;
    let (second, body) = post_signed(&app.router, payload).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(body, json!({ "received": true }));
    assert_eq!(app.repository.rows.lock().unwrap().len(), 1);
    // no second receipt either
    assert!(app.notifier.receipts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn invoice_attached_payment_intent_is_not_recorded() {
    let app = app();
    let payload = event_json(
        "payment_intent.succeeded",
        json!({ "id": "pi_9", "amount": 1100, "invoice": "in_9" }),
    );

    let (status, body) = post_signed(&app.router, payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "received": true }));
    assert!(app.repository.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn invoice_paid_records_a_monthly_donation_with_customer_attribution() {
    let app = app();
    app.gateway.customers.lock().unwrap().push(GatewayCustomer {
        id: "cus_1".to_string(),
        email: Some("b@x.com".to_string()),
        name: Some("B".to_string()),
    });

    let payload = event_json(
        "invoice.paid",
        json!({
            "id": "in_1",
            "amount_paid": 1100,
            "subscription": "sub_1",
            "customer": "cus_1",
            "payment_intent": "pi_2"
        }),
    );

    let (status, _) = post_signed(&app.router, payload).await;
    assert_eq!(status, StatusCode::OK);

    let rows = app.repository.rows.lock().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].amount, 1100);
    assert_eq!(rows[0].frequency, DonationFrequency::Monthly);
    assert_eq!(rows[0].stripe_payment_id, "pi_2");
    assert_eq!(rows[0].stripe_customer_id.as_deref(), Some("cus_1"));
    assert_eq!(rows[0].stripe_subscription_id.as_deref(), Some("sub_1"));
    assert_eq!(rows[0].donor_email, "b@x.com");
    assert_eq!(rows[0].donor_name, "B");
}

#[tokio::test]
async fn invoice_paid_with_unknown_customer_falls_back_to_sentinels() {
    let app = app();
    let payload = event_json(
        "invoice.paid",
        json!({
            "id": "in_1",
            "amount_paid": 1100,
            "subscription": "sub_1",
            "customer": "cus_missing",
            "payment_intent": "pi_2"
        }),
    );

    let (status, _) = post_signed(&app.router, payload).await;
    assert_eq!(status, StatusCode::OK);

    let rows = app.repository.rows.lock().unwrap();
    assert_eq!(rows[0].donor_email, "donor@unknown");
    assert_eq!(rows[0].donor_name, "Donor");
    // sentinel donors get no receipt
    assert!(app.notifier.receipts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn invoice_paid_missing_references_is_a_no_op() {
    let app = app();
    for object in [
        // no subscription
        json!({ "id": "in_1", "amount_paid": 1100, "customer": "cus_1", "payment_intent": "pi_2" }),
        // no customer
        json!({ "id": "in_1", "amount_paid": 1100, "subscription": "sub_1", "payment_intent": "pi_2" }),
        // no payment intent
        json!({ "id": "in_1", "amount_paid": 1100, "subscription": "sub_1", "customer": "cus_1" }),
    ] {
        let (status, body) = post_signed(&app.router, event_json("invoice.paid", object)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "received": true }));
    }
    assert!(app.repository.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn zero_amount_invoice_is_acknowledged_without_recording() {
    let app = app();
    let payload = event_json(
        "invoice.paid",
        json!({
            "id": "in_trial",
            "amount_paid": 0,
            "subscription": "sub_1",
            "customer": "cus_1",
            "payment_intent": "pi_trial"
        }),
    );

    let (status, body) = post_signed(&app.router, payload.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "received": true }));
    assert!(app.repository.rows.lock().unwrap().is_empty());

    // redelivery stays a 200 no-op rather than looping on an insert error
    let (status, _) = post_signed(&app.router, payload).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unrelated_event_type_is_acknowledged() {
    let app = app();
    let payload = event_json("charge.dispute.created", json!({ "id": "dp_1" }));

    let (status, body) = post_signed(&app.router, payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "received": true }));
    assert!(app.repository.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn bad_signature_is_rejected_with_400() {
    let app = app();
    let payload = event_json(
        "payment_intent.succeeded",
        json!({ "id": "pi_1", "amount": 2500 }),
    );
    let header = compute_test_signature("whsec_wrong", Utc::now().timestamp(), &payload);

    let (status, body) = post_webhook(&app.router, payload, Some(header)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert!(app.repository.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_signature_header_is_rejected_with_400() {
    let app = app();
    let payload = event_json(
        "payment_intent.succeeded",
        json!({ "id": "pi_1", "amount": 2500 }),
    );

    let (status, body) = post_webhook(&app.router, payload, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn empty_body_is_rejected_with_400() {
    let app = app();
    let header = compute_test_signature(SECRET, Utc::now().timestamp(), b"");

    let (status, body) = post_webhook(&app.router, Vec::new(), Some(header)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn stale_timestamp_is_rejected_with_400() {
    let app = app();
    let payload = event_json(
        "payment_intent.succeeded",
        json!({ "id": "pi_1", "amount": 2500 }),
    );
    let header = compute_test_signature(SECRET, Utc::now().timestamp() - 3600, &payload);

    let (status, _) = post_webhook(&app.router, payload, Some(header)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Intent origination
// =============================================================================

#[tokio::test]
async fn donation_intent_returns_client_secret() {
    let app = app();
    let (status, body) = post_json(
        &app.router,
        "/api/v1/payments/donation-intent",
        json!({
            "amount": 2500,
            "currency": "usd",
            "donorEmail": "a@x.com",
            "donorName": "A"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "clientSecret": "pi_new_secret_x" }));

    let requests = app.gateway.intent_requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].amount, 2500);
}

#[tokio::test]
async fn donation_intent_below_minimum_never_reaches_the_gateway() {
    let app = app();
    let (status, body) = post_json(
        &app.router,
        "/api/v1/payments/donation-intent",
        json!({ "amount": 50, "currency": "usd" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert!(app.gateway.intent_requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn subscription_creates_customer_once_and_reuses_it() {
    let app = app();
    let request = json!({ "planId": "price_monthly_11", "email": "a@x.com", "name": "A" });

    let (status, body) =
        post_json(&app.router, "/api/v1/payments/subscription", request.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body,
        json!({ "subscriptionId": "sub_new", "clientSecret": "pi_sub_secret_x" })
    );

    let (status, _) = post_json(&app.router, "/api/v1/payments/subscription", request).await;
    assert_eq!(status, StatusCode::CREATED);

    // second call found the customer created by the first
    assert_eq!(app.gateway.customers.lock().unwrap().len(), 1);
    let subs = app.gateway.subscription_requests.lock().unwrap();
    assert_eq!(subs.len(), 2);
    assert_eq!(subs[0].0, subs[1].0);
}

#[tokio::test]
async fn health_endpoint_responds() {
    let app = app();
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
