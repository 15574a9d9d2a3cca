//! Domain layer. Pure types and logic, no I/O.

pub mod donation;
