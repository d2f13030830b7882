//! CardWatch reporting backend client.
//!
//! One blocking HTTP request per call, JSON in and out. Non-2xx responses
//! become [`ApiError::Status`] carrying the flat user-facing message for the
//! operation; every failure is logged before it is returned.

pub mod client;
pub mod endpoints;
pub mod error;

pub use client::{ApiClient, ReportingApi};
pub use endpoints::{Endpoints, DEFAULT_BASE_URL};
pub use error::{ApiError, Result};
