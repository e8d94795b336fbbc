//! PostgreSQL-backed store.
//!
//! # Atomicity Guarantees
//!
//! `redeem` runs inside a single transaction that locks the invitation row
//! with `SELECT ... FOR UPDATE`. Concurrent redemptions of the same invitation
//! queue on that lock, and each one re-validates against the committed
//! `used_count` of the previous holder before incrementing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::DbPool;
use crate::models::{
    invitation::Invitation, kiosk::KioskDevice, notification::Notification,
    visitor::VisitorRecord,
};
use crate::services::invitation_validator::is_redeemable;
use crate::store::{
    HealthProbe, InvitationStore, KioskStore, NotificationStore, Redemption, RejectionReason,
    StoreError, StoreResult, VisitorStore,
};

/// serialization_failure, deadlock_detected
const CONFLICT_SQLSTATES: [&str; 2] = ["40001", "40P01"];

/// check_violation, raised by the used_count bound on `invitations`
const CHECK_VIOLATION_SQLSTATE: &str = "23514";

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn redeem_in_transaction(
        &self,
        id: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Redemption> {
        let mut tx = self.pool.begin().await?;

        // Row lock held until commit or rollback
        let invitation = sqlx::query_as::<_, Invitation>(
            "SELECT * FROM invitations WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(invitation) = invitation else {
            tx.rollback().await?;
            return Ok(Redemption::Rejected(RejectionReason::NotFound));
        };

        if !is_redeemable(&invitation, now) {
            tx.rollback().await?;
            return Ok(Redemption::Rejected(RejectionReason::NotRedeemable));
        }

        let used_count: i32 = sqlx::query_scalar(
            "UPDATE invitations SET used_count = used_count + 1 WHERE id = $1 RETURNING used_count",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Redemption::Redeemed { used_count })
    }
}

/// Map database-level aborts of the redeem transaction to a rejection.
fn rejection_for(err: &StoreError) -> Option<RejectionReason> {
    let StoreError::Database(sqlx::Error::Database(db_err)) = err else {
        return None;
    };
    let code = db_err.code()?;

    if CONFLICT_SQLSTATES.contains(&code.as_ref()) {
        Some(RejectionReason::Conflict)
    } else if code == CHECK_VIOLATION_SQLSTATE {
        Some(RejectionReason::NotRedeemable)
    } else {
        None
    }
}

#[async_trait]
impl InvitationStore for PgStore {
    async fn fetch(&self, id: &str) -> StoreResult<Option<Invitation>> {
        let invitation = sqlx::query_as::<_, Invitation>("SELECT * FROM invitations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(invitation)
    }

    async fn redeem(&self, id: &str, now: DateTime<Utc>) -> StoreResult<Redemption> {
        match self.redeem_in_transaction(id, now).await {
            Err(err) => match rejection_for(&err) {
                Some(reason) => Ok(Redemption::Rejected(reason)),
                None => Err(err),
            },
            outcome => outcome,
        }
    }
}

#[async_trait]
impl VisitorStore for PgStore {
    async fn insert_visitor(&self, visitor: &VisitorRecord) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO visitors (
                id,
                name,
                phone,
                email,
                company,
                visiting_flat,
                purpose,
                host_id,
                host_name,
                photo_url,
                qr_code,
                status,
                entry_time,
                check_in_time,
                is_pre_approved,
                valid_until
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(visitor.id)
        .bind(&visitor.name)
        .bind(&visitor.phone)
        .bind(&visitor.email)
        .bind(&visitor.company)
        .bind(&visitor.visiting_flat)
        .bind(&visitor.purpose)
        .bind(&visitor.host_id)
        .bind(&visitor.host_name)
        .bind(&visitor.photo_url)
        .bind(&visitor.qr_code)
        .bind(&visitor.status)
        .bind(visitor.entry_time)
        .bind(visitor.check_in_time)
        .bind(visitor.is_pre_approved)
        .bind(visitor.valid_until)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_visitor(&self, id: Uuid) -> StoreResult<Option<VisitorRecord>> {
        let visitor = sqlx::query_as::<_, VisitorRecord>("SELECT * FROM visitors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(visitor)
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn append_notification(&self, notification: &Notification) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id,
                notification_type,
                title,
                message,
                visitor_id,
                visitor_name,
                visitor_phone,
                flat_no,
                host_name,
                purpose,
                created_at,
                read,
                target_role,
                target_user_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(notification.id)
        .bind(notification.kind.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.visitor_id)
        .bind(&notification.visitor_name)
        .bind(&notification.visitor_phone)
        .bind(&notification.flat_no)
        .bind(&notification.host_name)
        .bind(&notification.purpose)
        .bind(notification.timestamp)
        .bind(notification.read)
        .bind(notification.target_role())
        .bind(notification.target_user_id())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl KioskStore for PgStore {
    async fn find_active_kiosk(&self, key_hash: &str) -> StoreResult<Option<KioskDevice>> {
        let kiosk = sqlx::query_as::<_, KioskDevice>(
            "SELECT id, key_hash, gate_name, created_at, is_active
             FROM kiosk_devices
             WHERE key_hash = $1 AND is_active = true",
        )
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(kiosk)
    }
}

#[async_trait]
impl HealthProbe for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
