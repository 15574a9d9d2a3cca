//! Stripe webhook event envelope and the payload objects we read.
//!
//! Only the fields the pipeline inspects are modeled; everything else in
//! the payload is ignored by serde. Fields Stripe may deliver either as a
//! bare id string or as an embedded object use [`Expandable`].

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Deserialized Stripe webhook event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StripeEvent {
    /// Stripe event ID (evt_xxx)
    pub id: String,

    /// Event type string, e.g. "payment_intent.succeeded"
    #[serde(rename = "type")]
    pub event_type: String,

    /// Unix timestamp when the event was created
    pub created: i64,

    /// Event payload
    pub data: StripeEventData,

    /// Whether this is a live mode event
    #[serde(default)]
    pub livemode: bool,

    /// API version used to render the event
    #[serde(default)]
    pub api_version: Option<String>,
}

/// The `data` portion of a Stripe event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StripeEventData {
    /// The object the event describes, kept raw until the classifier
    /// knows which shape to expect.
    pub object: Value,
}

/// A reference Stripe may expand inline or deliver as a bare id.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Expandable<T> {
    Id(String),
    Object(Box<T>),
}

impl<T> Expandable<T> {
    pub fn as_object(&self) -> Option<&T> {
        match self {
            Self::Id(_) => None,
            Self::Object(obj) => Some(obj),
        }
    }
}

/// Minimal object carrying just an id, the target of most expandable
/// references in webhook payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectRef {
    pub id: String,
}

impl Expandable<ObjectRef> {
    /// The referenced id, however it was delivered.
    pub fn ref_id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Object(obj) => &obj.id,
        }
    }
}

/// The object of a `payment_intent.succeeded` event.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntentObject {
    pub id: String,

    /// Amount in minor currency units.
    pub amount: i64,

    /// Set when the intent was created to settle an invoice. Such
    /// intents are recorded through the invoice event instead.
    #[serde(default)]
    pub invoice: Option<Expandable<ObjectRef>>,

    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl PaymentIntentObject {
    pub fn donor_email(&self) -> Option<&str> {
        self.metadata.get("donorEmail").map(String::as_str)
    }

    pub fn donor_name(&self) -> Option<&str> {
        self.metadata.get("donorName").map(String::as_str)
    }
}

/// The object of an `invoice.paid` event.
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceObject {
    pub id: String,

    /// Amount actually collected, in minor currency units.
    #[serde(default)]
    pub amount_paid: i64,

    #[serde(default)]
    pub subscription: Option<Expandable<ObjectRef>>,

    #[serde(default)]
    pub customer: Option<Expandable<ObjectRef>>,

    #[serde(default)]
    pub payment_intent: Option<Expandable<ObjectRef>>,
}
