//! Kiosk key authentication middleware.
//!
//! Every `/api/v1` request must come from a registered kiosk:
//! 1. Extract the key from the Authorization header
//! 2. Hash it and look it up among active kiosks
//! 3. Inject the kiosk context into the request
//! 4. Reject unknown keys with HTTP 401

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{app::AppState, error::AppError, models::kiosk::hash_kiosk_key};

/// Identity of the kiosk that made the request.
///
/// Handlers extract it with `Extension<KioskContext>`.
#[derive(Debug, Clone)]
pub struct KioskContext {
    pub kiosk_id: Uuid,

    /// Gate the kiosk is installed at, used in logs
    pub gate_name: String,
}

/// Expected header format:
/// ```text
/// Authorization: Bearer <kiosk key>
/// ```
pub async fn kiosk_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let kiosk_key = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AppError::InvalidKioskKey)?;

    let kiosk = state
        .kiosks
        .find_active_kiosk(&hash_kiosk_key(kiosk_key))
        .await?
        .ok_or(AppError::InvalidKioskKey)?;

    request.extensions_mut().insert(KioskContext {
        kiosk_id: kiosk.id,
        gate_name: kiosk.gate_name,
    });

    Ok(next.run(request).await)
}
