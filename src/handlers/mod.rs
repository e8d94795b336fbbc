//! HTTP request handlers.
//!
//! Handlers translate kiosk requests into registrar calls and map the
//! outcome to a JSON response.

/// Scan validation and visitor registration
pub mod check_in;
/// Service health
pub mod health;
/// Visitor lookup
pub mod visitors;
