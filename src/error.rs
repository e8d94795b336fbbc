//! Error types and HTTP error response handling.
//!
//! `CheckInError` is the taxonomy of the check-in flow itself: every variant
//! except `NotificationFailure` carries the message a visitor sees on the
//! kiosk. `AppError` wraps it for the HTTP layer and maps each case to a
//! status code and JSON body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::store::StoreError;

/// Failures of the check-in flow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckInError {
    /// Scanned text is not a visitor invitation payload.
    #[error("Invalid QR code format")]
    MalformedCode,

    /// No invitation exists for the scanned id.
    #[error("Invitation not found")]
    InvitationNotFound,

    /// Invitation is inactive, outside its validity window, or used up.
    #[error("This invitation has expired or is no longer valid")]
    InvitationNotRedeemable,

    /// A mandatory registration form field was left blank.
    #[error("Please enter visitor {field}")]
    MissingRequiredField { field: &'static str },

    /// The atomic redemption did not go through.
    ///
    /// Deliberately generic: a lost race, an invitation that expired since the
    /// scan and an exhausted invitation all read the same to the visitor.
    #[error("Failed to validate invitation")]
    RedemptionRejected,

    /// Visitor record could not be written after the invitation was redeemed.
    #[error("Failed to record visitor check-in")]
    PersistenceFailure,

    /// The invitation lookup failed for infrastructure reasons.
    #[error("Invitation service is unavailable, please try again")]
    StoreUnavailable,

    /// The camera could not be started.
    #[error("Failed to start camera. Please check permissions.")]
    ScannerUnavailable,

    /// A notification write failed. Logged, never shown.
    #[error("Failed to send notification")]
    NotificationFailure,
}

impl CheckInError {
    /// Stable machine-readable code used in API responses.
    pub fn code(&self) -> &'static str {
        match self {
            CheckInError::MalformedCode => "malformed_code",
            CheckInError::InvitationNotFound => "invitation_not_found",
            CheckInError::InvitationNotRedeemable => "invitation_not_redeemable",
            CheckInError::MissingRequiredField { .. } => "missing_required_field",
            CheckInError::RedemptionRejected => "redemption_rejected",
            CheckInError::PersistenceFailure => "persistence_failure",
            CheckInError::StoreUnavailable => "store_unavailable",
            CheckInError::ScannerUnavailable => "scanner_unavailable",
            CheckInError::NotificationFailure => "notification_failure",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            CheckInError::MalformedCode | CheckInError::MissingRequiredField { .. } => {
                StatusCode::BAD_REQUEST
            }
            CheckInError::InvitationNotFound => StatusCode::NOT_FOUND,
            CheckInError::InvitationNotRedeemable => StatusCode::UNPROCESSABLE_ENTITY,
            CheckInError::RedemptionRejected => StatusCode::CONFLICT,
            CheckInError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            CheckInError::PersistenceFailure
            | CheckInError::ScannerUnavailable
            | CheckInError::NotificationFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Application-wide error type returned by HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Check-in flow failure, carries its own status and message.
    #[error(transparent)]
    CheckIn(#[from] CheckInError),

    /// Backing store failed outside the check-in pipeline.
    ///
    /// Returns HTTP 500 and hides the details from the client.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Kiosk key is missing, unknown or deactivated.
    #[error("Invalid kiosk key")]
    InvalidKioskKey,

    /// Requested visitor record does not exist.
    #[error("Visitor not found")]
    VisitorNotFound,

    /// Request body or parameters are invalid.
    #[error("Invalid request")]
    InvalidRequest(String),
}

/// Convert AppError into an HTTP response.
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::CheckIn(ref err) => (err.status(), err.code(), err.to_string()),
            AppError::InvalidKioskKey => (
                StatusCode::UNAUTHORIZED,
                "invalid_kiosk_key",
                self.to_string(),
            ),
            AppError::VisitorNotFound => {
                (StatusCode::NOT_FOUND, "visitor_not_found", self.to_string())
            }
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::Store(ref err) => {
                tracing::error!("Store error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_message_names_the_field() {
        let err = CheckInError::MissingRequiredField { field: "name" };
        assert_eq!(err.to_string(), "Please enter visitor name");
        assert_eq!(err.code(), "missing_required_field");
    }

    #[test]
    fn check_in_errors_map_to_expected_status() {
        let cases = [
            (CheckInError::MalformedCode, StatusCode::BAD_REQUEST),
            (CheckInError::InvitationNotFound, StatusCode::NOT_FOUND),
            (
                CheckInError::InvitationNotRedeemable,
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (CheckInError::RedemptionRejected, StatusCode::CONFLICT),
            (CheckInError::StoreUnavailable, StatusCode::SERVICE_UNAVAILABLE),
            (
                CheckInError::PersistenceFailure,
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }

    #[test]
    fn store_errors_are_hidden_behind_500() {
        let response =
            AppError::from(StoreError::Unavailable("connection refused".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn invalid_kiosk_key_is_unauthorized() {
        assert_eq!(
            AppError::InvalidKioskKey.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
