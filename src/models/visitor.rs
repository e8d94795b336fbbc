//! Visitor data models and API request/response types.
//!
//! This module defines:
//! - `VisitorRecord`: Database entity created once per successful redemption
//! - `RegistrationForm`: Fields the visitor fills in at the kiosk
//! - `RegisterRequest` / `VisitorResponse`: HTTP bodies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CheckInError;
use crate::models::invitation::Invitation;

/// Status of every visitor created by a QR check-in.
pub const STATUS_CHECKED_IN: &str = "checked_in";

/// Represents a visitor record from the database.
///
/// # Database Table
///
/// Maps to the `visitors` table. A row is written exactly once, right after
/// the invitation it came from was redeemed, and is never updated by the
/// check-in flow.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow, Serialize, Deserialize)]
pub struct VisitorRecord {
    /// Random v4 identifier, generated by the kiosk service
    pub id: Uuid,

    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,

    /// Flat being visited, copied from the invitation
    pub visiting_flat: String,
    pub purpose: String,
    pub host_id: String,
    pub host_name: String,

    /// Reference photo copied from the invitation
    pub photo_url: Option<String>,

    /// Id of the invitation that was redeemed for this visitor
    pub qr_code: String,

    /// Always "checked_in" for QR visitors
    pub status: String,

    pub entry_time: DateTime<Utc>,
    pub check_in_time: DateTime<Utc>,

    /// QR visitors skip guard approval
    pub is_pre_approved: bool,

    /// Visitors admitted by invitation carry no validity of their own
    pub valid_until: Option<DateTime<Utc>>,
}

impl VisitorRecord {
    /// Build the record for a visitor admitted on `invitation`.
    ///
    /// Entry and check-in time are both `now`; the id is freshly generated.
    pub fn checked_in(invitation: &Invitation, form: ValidatedForm, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: form.name,
            phone: form.phone,
            email: form.email,
            company: form.company,
            visiting_flat: invitation.flat_no.clone(),
            purpose: invitation.purpose.clone(),
            host_id: invitation.host_id.clone(),
            host_name: invitation.host_name.clone(),
            photo_url: invitation.image_url.clone(),
            qr_code: invitation.id.clone(),
            status: STATUS_CHECKED_IN.to_string(),
            entry_time: now,
            check_in_time: now,
            is_pre_approved: true,
            valid_until: None,
        }
    }
}

/// Registration form as submitted by the visitor.
///
/// # Validation
///
/// - `name`: Required, must not be blank
/// - `phone`, `email`, `company`: Optional, blank values are dropped
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
}

/// Registration form that passed field validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedForm {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
}

impl RegistrationForm {
    /// Trim every field and check that the visitor gave a name.
    pub fn validate(self) -> Result<ValidatedForm, CheckInError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CheckInError::MissingRequiredField { field: "name" });
        }

        Ok(ValidatedForm {
            name: name.to_string(),
            phone: non_blank(self.phone),
            email: non_blank(self.email),
            company: non_blank(self.company),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Request body for `POST /api/v1/check-in/register`.
///
/// # JSON Example
///
/// ```json
/// {
///   "invitation_id": "inv_7Hq2",
///   "name": "Ravi Kumar",
///   "phone": "+91 98450 00000",
///   "company": "QuickParcel"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub invitation_id: String,

    #[serde(flatten)]
    pub form: RegistrationForm,
}

/// Response body for visitor endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct VisitorResponse {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub visiting_flat: String,
    pub purpose: String,
    pub host_name: String,
    pub status: String,
    pub check_in_time: DateTime<Utc>,
    pub is_pre_approved: bool,
}

/// This transformation drops the host id and the redeemed invitation id.
impl From<VisitorRecord> for VisitorResponse {
    fn from(visitor: VisitorRecord) -> Self {
        Self {
            id: visitor.id,
            name: visitor.name,
            phone: visitor.phone,
            email: visitor.email,
            company: visitor.company,
            visiting_flat: visitor.visiting_flat,
            purpose: visitor.purpose,
            host_name: visitor.host_name,
            status: visitor.status,
            check_in_time: visitor.check_in_time,
            is_pre_approved: visitor.is_pre_approved,
        }
    }
}
