//! Data models representing database entities and API bodies.

/// QR invitation issued by a host
pub mod invitation;
/// Check-in terminal authentication
pub mod kiosk;
/// Guard and host notifications
pub mod notification;
/// Visitor record and registration form
pub mod visitor;
