//! Kiosk device model used to authenticate check-in terminals.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// A registered check-in kiosk.
///
/// # Database Table
///
/// Maps to `kiosk_devices`. Only the SHA-256 hash of the kiosk key is stored;
/// deactivating a kiosk revokes its key without deleting the row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct KioskDevice {
    pub id: Uuid,

    /// SHA-256 of the kiosk key, 64 hex characters
    pub key_hash: String,

    /// Gate or lobby the kiosk is installed at
    pub gate_name: String,

    pub created_at: DateTime<Utc>,

    pub is_active: bool,
}

/// Hex-encoded SHA-256 of a presented kiosk key.
pub fn hash_kiosk_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}
