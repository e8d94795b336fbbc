//! In-process store backing the test suites.
//!
//! `redeem` holds the invitation map lock across read, validate and write,
//! which gives it the same serialization a row lock gives the Postgres store.
//! Failure switches let tests simulate an unavailable backend per collection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{
    invitation::Invitation,
    kiosk::{KioskDevice, hash_kiosk_key},
    notification::Notification,
    visitor::VisitorRecord,
};
use crate::services::invitation_validator::is_redeemable;
use crate::store::{
    HealthProbe, InvitationStore, KioskStore, NotificationStore, Redemption, RejectionReason,
    StoreError, StoreResult, VisitorStore,
};

#[derive(Default)]
pub struct MemoryStore {
    invitations: Mutex<HashMap<String, Invitation>>,
    visitors: Mutex<HashMap<Uuid, VisitorRecord>>,
    notifications: Mutex<Vec<Notification>>,
    kiosks: Mutex<HashMap<String, KioskDevice>>,

    fail_invitations: AtomicBool,
    fail_visitors: AtomicBool,
    fail_notifications: AtomicBool,

    fetch_calls: AtomicUsize,
    redeem_calls: AtomicUsize,
    notification_attempts: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_invitation(&self, invitation: Invitation) {
        self.invitations
            .lock()
            .await
            .insert(invitation.id.clone(), invitation);
    }

    pub async fn invitation(&self, id: &str) -> Option<Invitation> {
        self.invitations.lock().await.get(id).cloned()
    }

    pub async fn visitors(&self) -> Vec<VisitorRecord> {
        self.visitors.lock().await.values().cloned().collect()
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().await.clone()
    }

    /// Register an active kiosk for `key`, storing only its hash.
    pub async fn register_kiosk(&self, key: &str, gate_name: &str) -> KioskDevice {
        let kiosk = KioskDevice {
            id: Uuid::new_v4(),
            key_hash: hash_kiosk_key(key),
            gate_name: gate_name.to_string(),
            created_at: Utc::now(),
            is_active: true,
        };
        self.kiosks
            .lock()
            .await
            .insert(kiosk.key_hash.clone(), kiosk.clone());
        kiosk
    }

    pub fn fail_invitation_access(&self, fail: bool) {
        self.fail_invitations.store(fail, Ordering::SeqCst);
    }

    pub fn fail_visitor_writes(&self, fail: bool) {
        self.fail_visitors.store(fail, Ordering::SeqCst);
    }

    pub fn fail_notification_writes(&self, fail: bool) {
        self.fail_notifications.store(fail, Ordering::SeqCst);
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn redeem_calls(&self) -> usize {
        self.redeem_calls.load(Ordering::SeqCst)
    }

    /// Notification writes attempted, successful or not.
    pub fn notification_attempts(&self) -> usize {
        self.notification_attempts.load(Ordering::SeqCst)
    }

    fn check(flag: &AtomicBool, collection: &str) -> StoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("{collection} unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl InvitationStore for MemoryStore {
    async fn fetch(&self, id: &str) -> StoreResult<Option<Invitation>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.fail_invitations, "invitations")?;

        Ok(self.invitations.lock().await.get(id).cloned())
    }

    async fn redeem(&self, id: &str, now: DateTime<Utc>) -> StoreResult<Redemption> {
        self.redeem_calls.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.fail_invitations, "invitations")?;

        let mut invitations = self.invitations.lock().await;

        let Some(snapshot) = invitations.get(id).cloned() else {
            return Ok(Redemption::Rejected(RejectionReason::NotFound));
        };

        if !is_redeemable(&snapshot, now) {
            return Ok(Redemption::Rejected(RejectionReason::NotRedeemable));
        }

        // Let competing redeemers run while the "transaction" is open.
        tokio::task::yield_now().await;

        let Some(invitation) = invitations.get_mut(id) else {
            return Ok(Redemption::Rejected(RejectionReason::NotFound));
        };
        invitation.used_count += 1;

        Ok(Redemption::Redeemed {
            used_count: invitation.used_count,
        })
    }
}

#[async_trait]
impl VisitorStore for MemoryStore {
    async fn insert_visitor(&self, visitor: &VisitorRecord) -> StoreResult<()> {
        Self::check(&self.fail_visitors, "visitors")?;

        self.visitors
            .lock()
            .await
            .insert(visitor.id, visitor.clone());
        Ok(())
    }

    async fn get_visitor(&self, id: Uuid) -> StoreResult<Option<VisitorRecord>> {
        Self::check(&self.fail_visitors, "visitors")?;

        Ok(self.visitors.lock().await.get(&id).cloned())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn append_notification(&self, notification: &Notification) -> StoreResult<()> {
        self.notification_attempts.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.fail_notifications, "notifications")?;

        self.notifications.lock().await.push(notification.clone());
        Ok(())
    }
}

#[async_trait]
impl KioskStore for MemoryStore {
    async fn find_active_kiosk(&self, key_hash: &str) -> StoreResult<Option<KioskDevice>> {
        Ok(self
            .kiosks
            .lock()
            .await
            .get(key_hash)
            .filter(|kiosk| kiosk.is_active)
            .cloned())
    }
}

#[async_trait]
impl HealthProbe for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Self::check(&self.fail_invitations, "invitations")
    }
}
