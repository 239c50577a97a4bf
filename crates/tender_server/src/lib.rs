//! tender_server — axum transport for the procurement services.
//! Binds requests, validates them, calls a domain service and maps domain
//! errors to HTTP responses.

pub mod config;
pub mod error;
pub mod handlers;
pub mod requests;
pub mod router;
