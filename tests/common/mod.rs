//! Shared fixtures for the integration suites.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use visitor_checkin_server::{
    models::{invitation::Invitation, visitor::RegistrationForm},
    services::{notification_dispatcher::NotificationDispatcher, registrar::Registrar},
    store::memory::MemoryStore,
};

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 10, 0, 0).unwrap()
}

/// Active invitation valid for an hour either side of `now`.
pub fn invitation_at(
    id: &str,
    max_visitors: i32,
    used_count: i32,
    now: DateTime<Utc>,
) -> Invitation {
    Invitation {
        id: id.to_string(),
        host_id: "host-42".to_string(),
        host_name: "Asha Rao".to_string(),
        flat_no: "B-402".to_string(),
        purpose: "Family visit".to_string(),
        notes: Some("Parking at gate 2".to_string()),
        valid_from: now - chrono::Duration::hours(1),
        valid_until: now + chrono::Duration::hours(1),
        is_active: true,
        max_visitors,
        used_count,
        image_url: Some("https://img.example/visitor.jpg".to_string()),
        created_at: now - chrono::Duration::days(1),
    }
}

pub fn invitation(id: &str, max_visitors: i32, used_count: i32) -> Invitation {
    invitation_at(id, max_visitors, used_count, fixed_now())
}

pub fn qr_payload(invitation_id: &str) -> String {
    json!({ "type": "visitor_invitation", "invitation_id": invitation_id }).to_string()
}

pub fn form(name: &str) -> RegistrationForm {
    RegistrationForm {
        name: name.to_string(),
        phone: Some("+91 98450 00000".to_string()),
        email: Some("ravi@example.com".to_string()),
        company: None,
    }
}

/// Registrar over `store` with the clock pinned to [`fixed_now`].
pub fn registrar(store: &Arc<MemoryStore>) -> Registrar {
    let dispatcher = NotificationDispatcher::new(store.clone(), Duration::from_secs(1));
    Registrar::new(store.clone(), store.clone(), dispatcher).with_clock(fixed_now)
}
