//! tender_core — pure domain layer of the procurement backend.
//!
//! Value types, the error taxonomy, the storage port traits and the two
//! domain services. No sqlx, no HTTP: the Postgres adapters live in
//! `tender_postgres`, the axum transport in `tender_server`.

pub mod error;
pub mod ports;
pub mod service;
pub mod types;

pub use error::ProcurementError;
pub use service::{BidService, TenderService};
