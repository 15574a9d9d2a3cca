//! Classifies verified Stripe events into recording decisions.
//!
//! Pure: no I/O, no clock. The application layer handles everything a
//! decision needs from the outside world (donor lookup, persistence).

use super::donation::{DonationFrequency, DonorIdentity, NewDonation};
use super::stripe_event::{InvoiceObject, PaymentIntentObject, StripeEvent};
use super::webhook_errors::WebhookError;

/// The recording decision for one verified event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A standalone one-time payment, donor identity already extracted
    /// from intent metadata.
    OneTime(NewDonation),

    /// A subscription invoice payment. The donor identity is unknown at
    /// this point; the draft carries the customer id so the caller can
    /// attempt a lookup.
    Recurring(NewDonation),

    /// Acknowledged without recording anything.
    Skip(SkipReason),
}

/// Why an event produced no donation record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The payment intent settles an invoice; the invoice event records
    /// it instead. Recording both would double-count the donation.
    InvoiceAttachedPayment,

    /// invoice.paid without a subscription reference.
    MissingSubscriptionRef,

    /// invoice.paid without a customer reference.
    MissingCustomerRef,

    /// invoice.paid without a payment-intent reference.
    MissingPaymentRef,

    /// invoice.paid that collected nothing (trial periods, fully
    /// discounted invoices). There is no donation to record.
    ZeroAmountInvoice,

    /// An event type the pipeline does not handle.
    UnhandledEventType(String),
}

impl SkipReason {
    pub fn as_str(&self) -> &str {
        match self {
            Self::InvoiceAttachedPayment => "invoice_attached_payment",
            Self::MissingSubscriptionRef => "missing_subscription_ref",
            Self::MissingCustomerRef => "missing_customer_ref",
            Self::MissingPaymentRef => "missing_payment_ref",
            Self::ZeroAmountInvoice => "zero_amount_invoice",
            Self::UnhandledEventType(_) => "unhandled_event_type",
        }
    }
}

/// Decide what a verified event means for the donation ledger.
pub fn classify(event: &StripeEvent) -> Result<Classification, WebhookError> {
    match event.event_type.as_str() {
        "payment_intent.succeeded" => classify_payment_intent(event),
        "invoice.paid" => classify_invoice(event),
        other => Ok(Classification::Skip(SkipReason::UnhandledEventType(
            other.to_string(),
        ))),
    }
}

fn classify_payment_intent(event: &StripeEvent) -> Result<Classification, WebhookError> {
    let intent: PaymentIntentObject = serde_json::from_value(event.data.object.clone())
        .map_err(|e| WebhookError::ParseError(e.to_string()))?;

    if intent.invoice.is_some() {
        return Ok(Classification::Skip(SkipReason::InvoiceAttachedPayment));
    }

    let donor = DonorIdentity::from_metadata(intent.donor_name(), intent.donor_email());

    Ok(Classification::OneTime(NewDonation {
        amount: intent.amount,
        donor,
        frequency: DonationFrequency::OneTime,
        stripe_payment_id: intent.id,
        stripe_customer_id: None,
        stripe_subscription_id: None,
    }))
}

fn classify_invoice(event: &StripeEvent) -> Result<Classification, WebhookError> {
    let invoice: InvoiceObject = serde_json::from_value(event.data.object.clone())
        .map_err(|e| WebhookError::ParseError(e.to_string()))?;

    let Some(subscription) = invoice.subscription.as_ref() else {
        return Ok(Classification::Skip(SkipReason::MissingSubscriptionRef));
    };
    let Some(customer) = invoice.customer.as_ref() else {
        return Ok(Classification::Skip(SkipReason::MissingCustomerRef));
    };
    let Some(payment_intent) = invoice.payment_intent.as_ref() else {
        return Ok(Classification::Skip(SkipReason::MissingPaymentRef));
    };
    if invoice.amount_paid <= 0 {
        return Ok(Classification::Skip(SkipReason::ZeroAmountInvoice));
    }

    Ok(Classification::Recurring(NewDonation {
        amount: invoice.amount_paid,
        donor: DonorIdentity::unknown(),
        frequency: DonationFrequency::Monthly,
        stripe_payment_id: payment_intent.ref_id().to_string(),
        stripe_customer_id: Some(customer.ref_id().to_string()),
        stripe_subscription_id: Some(subscription.ref_id().to_string()),
    }))
}
