//! Email notification adapter (Resend).

pub mod resend_notifier;

pub use resend_notifier::{ResendConfig, ResendNotifier};
