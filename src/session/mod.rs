//! Kiosk check-in session: the state machine behind the single-page flow.
//!
//! A `CheckInSession` is the whole per-visitor context. The UI layer owns
//! one, feeds it user actions (`scan`, `submit`, `retry`, `reset`) and
//! renders whatever [`CheckInSession::screen`] and
//! [`CheckInSession::take_toast`] report.
//!
//! ```text
//! Idle -> Scanning -> Validating -> AwaitingForm -> Redeeming -> Persisting -> Notifying -> Success
//!           |              |             |              |             |
//!           v              v             v              v             v
//!          Idle          Error      AwaitingForm      Error         Error
//!       (cancelled)               (field error)
//! ```

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::CheckInError;
use crate::models::{
    invitation::Invitation,
    visitor::{RegistrationForm, VisitorRecord},
};
use crate::services::registrar::Registrar;

pub mod scanner;

use scanner::{CameraFacing, CameraLease, ScanConfig, Scanner};

/// How long a toast stays on screen.
pub const TOAST_TTL: Duration = Duration::from_secs(5);

const SUCCESS_TOAST: &str = "Visitor logged successfully! You are now checked in.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Scanning,
    Validating,
    AwaitingForm,
    Redeeming,
    Persisting,
    Notifying,
    Success,
    Error,
}

/// Screens of the kiosk UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Welcome,
    Scanning,
    RegistrationForm,
    Success,
    Error,
}

impl Screen {
    pub fn id(&self) -> &'static str {
        match self {
            Screen::Welcome => "welcome",
            Screen::Scanning => "scanning",
            Screen::RegistrationForm => "registration-form",
            Screen::Success => "success",
            Screen::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// Transient banner shown over the current screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub text: String,
    pub severity: Severity,
    /// Auto-dismiss delay
    pub ttl: Duration,
}

impl Toast {
    fn new(text: impl Into<String>, severity: Severity) -> Self {
        Self {
            text: text.into(),
            severity,
            ttl: TOAST_TTL,
        }
    }
}

#[derive(Debug)]
pub struct CheckInSession {
    phase: Phase,
    invitation: Option<Invitation>,
    visitor: Option<VisitorRecord>,
    error: Option<CheckInError>,
    field_error: Option<CheckInError>,
    toast: Option<Toast>,
}

impl Default for CheckInSession {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            invitation: None,
            visitor: None,
            error: None,
            field_error: None,
            toast: None,
        }
    }
}

impl CheckInSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn screen(&self) -> Screen {
        match self.phase {
            Phase::Idle => Screen::Welcome,
            Phase::Scanning | Phase::Validating => Screen::Scanning,
            Phase::AwaitingForm | Phase::Redeeming | Phase::Persisting | Phase::Notifying => {
                Screen::RegistrationForm
            }
            Phase::Success => Screen::Success,
            Phase::Error => Screen::Error,
        }
    }

    /// Invitation snapshot taken when the scan was validated.
    pub fn invitation(&self) -> Option<&Invitation> {
        self.invitation.as_ref()
    }

    /// Visitor recorded by a successful submit.
    pub fn visitor(&self) -> Option<&VisitorRecord> {
        self.visitor.as_ref()
    }

    /// Error shown on the error screen.
    pub fn error(&self) -> Option<&CheckInError> {
        self.error.as_ref()
    }

    /// Form validation error shown next to the offending field.
    pub fn field_error(&self) -> Option<&CheckInError> {
        self.field_error.as_ref()
    }

    /// Pending toast, if any. Each toast is handed out once.
    pub fn take_toast(&mut self) -> Option<Toast> {
        self.toast.take()
    }

    /// Scan a QR code and validate the invitation it references.
    ///
    /// Holds the camera until the first decoded code arrives or `cancel`
    /// fires; the camera is stopped before validation starts and on every
    /// other exit. Only valid from `Idle`.
    pub async fn scan<S: Scanner + ?Sized>(
        &mut self,
        registrar: &Registrar,
        scanner: &mut S,
        config: &ScanConfig,
        cancel: &CancellationToken,
    ) -> Phase {
        if self.phase != Phase::Idle {
            tracing::warn!(phase = ?self.phase, "Scan requested outside of Idle");
            return self.phase;
        }
        self.enter(Phase::Scanning);

        let decoded = {
            let mut lease = match CameraLease::acquire(scanner, CameraFacing::Environment, config) {
                Ok(lease) => lease,
                Err(e) => {
                    tracing::error!("Error starting QR scanner: {}", e);
                    self.fail(CheckInError::ScannerUnavailable);
                    return self.phase;
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => None,
                decoded = lease.next_decoded() => decoded,
            }
        };

        let Some(raw) = decoded else {
            tracing::info!("Scan cancelled");
            self.enter(Phase::Idle);
            return self.phase;
        };

        self.enter(Phase::Validating);
        match registrar.validate_scan(&raw).await {
            Ok(invitation) => {
                self.invitation = Some(invitation);
                self.enter(Phase::AwaitingForm);
            }
            Err(e) => self.fail(e),
        }

        self.phase
    }

    /// Submit the registration form for the scanned invitation.
    ///
    /// A blank name keeps the session in `AwaitingForm` with a field error and
    /// does not touch the invitation.
    pub async fn submit(&mut self, registrar: &Registrar, form: RegistrationForm) -> Phase {
        if self.phase != Phase::AwaitingForm {
            tracing::warn!(phase = ?self.phase, "Form submitted outside of AwaitingForm");
            return self.phase;
        }
        let Some(invitation) = self.invitation.clone() else {
            tracing::warn!("Form submitted without a scanned invitation");
            return self.phase;
        };

        let form = match form.validate() {
            Ok(form) => form,
            Err(e) => {
                self.field_error = Some(e);
                return self.phase;
            }
        };
        self.field_error = None;

        self.enter(Phase::Redeeming);
        if let Err(e) = registrar.redeem(&invitation).await {
            self.fail(e);
            return self.phase;
        }

        self.enter(Phase::Persisting);
        let visitor = match registrar.persist(&invitation, form).await {
            Ok(visitor) => visitor,
            Err(e) => {
                self.fail(e);
                return self.phase;
            }
        };

        self.enter(Phase::Notifying);
        registrar.notify(&visitor).await;

        self.visitor = Some(visitor);
        self.toast = Some(Toast::new(SUCCESS_TOAST, Severity::Success));
        self.enter(Phase::Success);

        self.phase
    }

    /// Leave the error screen.
    ///
    /// Goes back to the form when an invitation was already scanned, otherwise
    /// to the welcome screen. A new submit re-validates the invitation
    /// atomically, so a stale snapshot cannot be redeemed past its limits.
    pub fn retry(&mut self) -> Phase {
        if self.phase != Phase::Error {
            return self.phase;
        }
        self.error = None;
        if self.invitation.is_some() {
            self.enter(Phase::AwaitingForm);
        } else {
            self.enter(Phase::Idle);
        }
        self.phase
    }

    /// Start over with a clean session.
    pub fn reset(&mut self) -> Phase {
        tracing::debug!(from = ?self.phase, "Session reset");
        *self = Self::default();
        self.phase
    }

    fn enter(&mut self, phase: Phase) {
        tracing::debug!(from = ?self.phase, to = ?phase, "Session phase change");
        self.phase = phase;
    }

    fn fail(&mut self, error: CheckInError) {
        tracing::info!(code = error.code(), "Check-in failed: {}", error);
        self.toast = Some(Toast::new(error.to_string(), Severity::Error));
        self.error = Some(error);
        self.enter(Phase::Error);
    }
}
