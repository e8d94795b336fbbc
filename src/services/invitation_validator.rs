//! Redeemability rule for invitations.

use chrono::{DateTime, Utc};

use crate::models::invitation::Invitation;

/// Whether one more visitor may be admitted on `invitation` at `now`.
///
/// The validity window is inclusive at both ends. Used both for the
/// pre-check after a scan and inside the redeem transaction.
pub fn is_redeemable(invitation: &Invitation, now: DateTime<Utc>) -> bool {
    invitation.is_active
        && now >= invitation.valid_from
        && now <= invitation.valid_until
        && invitation.used_count < invitation.max_visitors
}
