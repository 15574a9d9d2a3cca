//! HTTP adapters (axum).

pub mod payments;
