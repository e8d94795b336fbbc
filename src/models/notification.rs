//! Notification models written after a visitor checks in.
//!
//! Two notifications are produced per check-in: one for the guard desk and
//! one for the resident who issued the invitation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::visitor::VisitorRecord;

/// Role that receives the guard-desk notification.
pub const GUARD_ROLE: &str = "guard";

/// Kind of notification, stored in `notification_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Tells the guards a visitor was logged at the kiosk
    VisitorLogged,
    /// Tells the host their visitor is on the way
    VisitorCheckedIn,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::VisitorLogged => "visitor_logged",
            NotificationKind::VisitorCheckedIn => "visitor_checked_in",
        }
    }
}

/// Who a notification is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTarget {
    /// Everyone holding a role, e.g. "guard"
    Role(String),
    /// A single user, e.g. the host resident
    User(String),
}

/// A notification record.
///
/// # Database Table
///
/// Maps to the `notifications` table, which is append-only. Exactly one of
/// `target_role` / `target_user_id` is populated, depending on `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub visitor_id: Uuid,
    pub visitor_name: String,
    pub visitor_phone: Option<String>,
    pub flat_no: Option<String>,
    pub host_name: Option<String>,
    pub purpose: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    pub target: NotificationTarget,
}

impl Notification {
    /// Guard-desk notification: visitor logged and checked in.
    pub fn visitor_logged(visitor: &VisitorRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: NotificationKind::VisitorLogged,
            title: "Visitor Logged Successfully".to_string(),
            message: format!(
                "{} has been logged and checked in to visit {}",
                visitor.name, visitor.visiting_flat
            ),
            visitor_id: visitor.id,
            visitor_name: visitor.name.clone(),
            visitor_phone: None,
            flat_no: Some(visitor.visiting_flat.clone()),
            host_name: Some(visitor.host_name.clone()),
            purpose: visitor.purpose.clone(),
            timestamp: now,
            read: false,
            target: NotificationTarget::Role(GUARD_ROLE.to_string()),
        }
    }

    /// Host notification: their visitor has arrived.
    pub fn visitor_checked_in(visitor: &VisitorRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: NotificationKind::VisitorCheckedIn,
            title: "Visitor Checked In".to_string(),
            message: format!(
                "{} has checked in and is on their way to visit you",
                visitor.name
            ),
            visitor_id: visitor.id,
            visitor_name: visitor.name.clone(),
            visitor_phone: visitor.phone.clone(),
            flat_no: None,
            host_name: None,
            purpose: visitor.purpose.clone(),
            timestamp: now,
            read: false,
            target: NotificationTarget::User(visitor.host_id.clone()),
        }
    }

    pub fn target_role(&self) -> Option<&str> {
        match &self.target {
            NotificationTarget::Role(role) => Some(role),
            NotificationTarget::User(_) => None,
        }
    }

    pub fn target_user_id(&self) -> Option<&str> {
        match &self.target {
            NotificationTarget::User(user_id) => Some(user_id),
            NotificationTarget::Role(_) => None,
        }
    }
}
