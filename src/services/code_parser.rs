//! Decoding of scanned QR text into an invitation reference.

use serde::Deserialize;

use crate::error::CheckInError;
use crate::models::invitation::{INVITATION_CODE_TYPE, InvitationCode};

/// Lenient view of the payload so that a missing discriminator is a type
/// mismatch rather than a decode error.
#[derive(Debug, Deserialize)]
struct ScannedPayload {
    #[serde(rename = "type")]
    code_type: Option<String>,
    invitation_id: Option<String>,
}

/// Parse raw scanner output.
///
/// Returns the invitation reference only when the text is a JSON object whose
/// `type` is `"visitor_invitation"` and whose `invitation_id` is a non-empty
/// string. Anything else is [`CheckInError::MalformedCode`].
pub fn parse_invitation_code(raw: &str) -> Result<InvitationCode, CheckInError> {
    let payload: ScannedPayload = serde_json::from_str(raw.trim()).map_err(|e| {
        tracing::debug!("Scanned text is not a JSON object: {}", e);
        CheckInError::MalformedCode
    })?;

    if payload.code_type.as_deref() != Some(INVITATION_CODE_TYPE) {
        tracing::debug!(code_type = ?payload.code_type, "Scanned payload is not an invitation");
        return Err(CheckInError::MalformedCode);
    }

    let invitation_id = payload
        .invitation_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or(CheckInError::MalformedCode)?;

    Ok(InvitationCode {
        code_type: INVITATION_CODE_TYPE.to_string(),
        invitation_id,
    })
}
