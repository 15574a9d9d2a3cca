//! Payments HTTP surface: webhook ingestion and intent origination.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::PaymentsState;
pub use routes::router;
