//! HTTP middleware.

/// Kiosk key authentication
pub mod auth;
