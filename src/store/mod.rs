//! Storage contracts for the check-in flow.
//!
//! The flow needs point reads and writes on three collections (invitations,
//! visitors, notifications) plus one isolated read-modify-write: `redeem`.
//! Two backends implement these traits: [`postgres::PgStore`] for
//! production and [`memory::MemoryStore`] for tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    invitation::Invitation, kiosk::KioskDevice, notification::Notification,
    visitor::VisitorRecord,
};

pub mod memory;
pub mod postgres;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of an atomic redemption attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redemption {
    /// One use was consumed; `used_count` is the value after the increment.
    Redeemed { used_count: i32 },
    /// Nothing was written.
    Rejected(RejectionReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    NotFound,
    /// Inactive, outside its window, or no capacity left at commit time.
    NotRedeemable,
    /// The transaction was aborted by the database in favour of a concurrent writer.
    Conflict,
}

#[async_trait]
pub trait InvitationStore: Send + Sync {
    /// Point read; does not mutate anything.
    async fn fetch(&self, id: &str) -> StoreResult<Option<Invitation>>;

    /// Atomically re-read, re-validate against `now` and consume one use.
    ///
    /// Implementations must guarantee that concurrent calls never push
    /// `used_count` past `max_visitors`, and that a rejected attempt leaves
    /// the invitation untouched.
    async fn redeem(&self, id: &str, now: DateTime<Utc>) -> StoreResult<Redemption>;
}

#[async_trait]
pub trait VisitorStore: Send + Sync {
    /// Write a new visitor keyed by its id.
    async fn insert_visitor(&self, visitor: &VisitorRecord) -> StoreResult<()>;

    async fn get_visitor(&self, id: Uuid) -> StoreResult<Option<VisitorRecord>>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Append a notification. There is no update or delete.
    async fn append_notification(&self, notification: &Notification) -> StoreResult<()>;
}

#[async_trait]
pub trait KioskStore: Send + Sync {
    async fn find_active_kiosk(&self, key_hash: &str) -> StoreResult<Option<KioskDevice>>;
}

#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Cheap round trip proving the store is reachable.
    async fn ping(&self) -> StoreResult<()>;
}
