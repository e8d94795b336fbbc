//! Visitor Check-In Service
//!
//! Backend and kiosk core for QR-invitation visitor check-in. A visitor scans
//! the invitation a resident sent them, fills in their details, and is
//! checked in while the guard desk and the host are notified.
//!
//! # Architecture
//!
//! - **Services**: code parsing, invitation validation, the registrar
//!   pipeline and notification fan-out
//! - **Store**: storage traits with PostgreSQL (sqlx) and in-memory backends
//! - **Session**: the kiosk state machine and scoped camera handling
//! - **HTTP**: Axum router authenticated by kiosk keys
//!
//! The one concurrency-sensitive operation is redeeming an invitation: the
//! store serializes concurrent redemptions so an invitation is never used by
//! more visitors than it allows.

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod session;
pub mod store;
