//! Invitation data models and API response types.
//!
//! This module defines:
//! - `Invitation`: Database entity issued by a host
//! - `InvitationCode`: The decoded QR payload that references an invitation
//! - `InvitationSummary`: What a kiosk shows after a successful scan

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discriminator carried by every visitor invitation QR payload.
pub const INVITATION_CODE_TYPE: &str = "visitor_invitation";

/// Represents an invitation record from the database.
///
/// # Database Table
///
/// Maps to the `invitations` table. Every field except `used_count` and
/// `is_active` is fixed when the host issues the invitation.
///
/// # Capacity
///
/// `used_count` starts at 0 and is only ever incremented by redemption, one
/// visitor at a time, up to `max_visitors`. A CHECK constraint rejects any
/// write that would overshoot.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize, Deserialize)]
pub struct Invitation {
    /// Opaque identifier, also the value encoded in the QR code
    pub id: String,

    /// Resident who issued the invitation
    pub host_id: String,

    pub host_name: String,

    /// Flat the visitor is expected at
    pub flat_no: String,

    pub purpose: String,

    pub notes: Option<String>,

    /// Start of the validity window (inclusive)
    pub valid_from: DateTime<Utc>,

    /// End of the validity window (inclusive)
    pub valid_until: DateTime<Utc>,

    /// Kill-switch the host can flip to revoke the invitation
    pub is_active: bool,

    /// Number of visitors allowed in on this invitation (at least 1)
    pub max_visitors: i32,

    /// Number of visitors already checked in on this invitation
    pub used_count: i32,

    /// Reference photo of the expected visitor, copied onto the visitor record
    pub image_url: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Invitation {
    /// Uses left before the invitation is exhausted.
    pub fn remaining_uses(&self) -> i32 {
        (self.max_visitors - self.used_count).max(0)
    }
}

/// Decoded QR payload.
///
/// # JSON Example
///
/// ```json
/// {
///   "type": "visitor_invitation",
///   "invitation_id": "inv_7Hq2"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationCode {
    #[serde(rename = "type")]
    pub code_type: String,

    pub invitation_id: String,
}

/// Response body for a successful scan.
///
/// Carries what the registration form shows in its invitation panel.
#[derive(Debug, Serialize, Deserialize)]
pub struct InvitationSummary {
    pub id: String,
    pub host_name: String,
    pub flat_no: String,
    pub purpose: String,
    pub notes: Option<String>,
    pub valid_until: DateTime<Utc>,
    pub remaining_uses: i32,
}

impl From<&Invitation> for InvitationSummary {
    fn from(invitation: &Invitation) -> Self {
        Self {
            id: invitation.id.clone(),
            host_name: invitation.host_name.clone(),
            flat_no: invitation.flat_no.clone(),
            purpose: invitation.purpose.clone(),
            notes: invitation.notes.clone(),
            valid_until: invitation.valid_until,
            remaining_uses: invitation.remaining_uses(),
        }
    }
}

/// Request body for `POST /api/v1/check-in/scan`.
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    /// Raw text decoded from the QR code
    pub qr_data: String,
}
