//! Check-in HTTP handlers.
//!
//! - POST /api/v1/check-in/scan - Validate a scanned QR code
//! - POST /api/v1/check-in/register - Register and check in a visitor

use axum::{Extension, Json, extract::State, http::StatusCode};

use crate::{
    app::AppState,
    error::AppError,
    middleware::auth::KioskContext,
    models::{
        invitation::{InvitationSummary, ScanRequest},
        visitor::{RegisterRequest, VisitorResponse},
    },
};

/// Validate scanned QR text and describe the invitation.
///
/// # Request Body
///
/// ```json
/// {
///   "qr_data": "{\"type\":\"visitor_invitation\",\"invitation_id\":\"inv_7Hq2\"}"
/// }
/// ```
///
/// # Response (200)
///
/// ```json
/// {
///   "id": "inv_7Hq2",
///   "host_name": "Asha Rao",
///   "flat_no": "B-402",
///   "purpose": "Guest",
///   "notes": null,
///   "valid_until": "2025-12-21T20:00:00Z",
///   "remaining_uses": 1
/// }
/// ```
pub async fn scan_code(
    State(state): State<AppState>,
    Extension(kiosk): Extension<KioskContext>,
    Json(request): Json<ScanRequest>,
) -> Result<Json<InvitationSummary>, AppError> {
    let invitation = state.registrar.validate_scan(&request.qr_data).await?;

    tracing::info!(
        gate = %kiosk.gate_name,
        invitation_id = %invitation.id,
        "Invitation scanned"
    );

    Ok(Json(InvitationSummary::from(&invitation)))
}

/// Redeem an invitation and check the visitor in.
///
/// The invitation is re-fetched and pre-validated before the form is looked
/// at, mirroring the scan-then-register order of the kiosk.
///
/// # Response (201)
///
/// The created visitor record.
pub async fn register_visitor(
    State(state): State<AppState>,
    Extension(kiosk): Extension<KioskContext>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<VisitorResponse>), AppError> {
    let invitation_id = request.invitation_id.trim();
    if invitation_id.is_empty() {
        return Err(AppError::InvalidRequest(
            "invitation_id is required".to_string(),
        ));
    }

    let invitation = state.registrar.validate_invitation(invitation_id).await?;
    let visitor = state.registrar.register(&invitation, request.form).await?;

    tracing::info!(
        gate = %kiosk.gate_name,
        kiosk_id = %kiosk.kiosk_id,
        visitor_id = %visitor.id,
        "Visitor registered"
    );

    Ok((StatusCode::CREATED, Json(visitor.into())))
}
