//! Visitor registrar - the check-in pipeline.
//!
//! # Process
//!
//! 1. Parse the scanned code and fetch the invitation it references
//! 2. Pre-validate the invitation (read only)
//! 3. Validate the registration form
//! 4. Redeem one use of the invitation atomically
//! 5. Persist the visitor record
//! 6. Notify guard and host, best effort
//!
//! Each step is exposed on its own so that [`crate::session::CheckInSession`]
//! can track the phase it is in; [`Registrar::register`] chains steps 3-6 for
//! callers that only need the outcome.
//!
//! # Consistency
//!
//! There is no compensation between steps 4 and 5. If the visitor write fails
//! the invitation use stays consumed; this is logged at `error` level with
//! the invitation id so it can be reconciled by hand.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::error::CheckInError;
use crate::models::{
    invitation::Invitation,
    visitor::{RegistrationForm, ValidatedForm, VisitorRecord},
};
use crate::services::code_parser::parse_invitation_code;
use crate::services::invitation_validator::is_redeemable;
use crate::services::notification_dispatcher::{DispatchReport, NotificationDispatcher};
use crate::store::{InvitationStore, Redemption, VisitorStore};

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Clone)]
pub struct Registrar {
    invitations: Arc<dyn InvitationStore>,
    visitors: Arc<dyn VisitorStore>,
    dispatcher: NotificationDispatcher,
    clock: Clock,
}

impl Registrar {
    pub fn new(
        invitations: Arc<dyn InvitationStore>,
        visitors: Arc<dyn VisitorStore>,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            invitations,
            visitors,
            dispatcher,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock, used to pin time in tests.
    pub fn with_clock(
        mut self,
        clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static,
    ) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Validate scanner output: parse, fetch and pre-check.
    ///
    /// A malformed code never reaches the store.
    pub async fn validate_scan(&self, raw: &str) -> Result<Invitation, CheckInError> {
        let code = parse_invitation_code(raw)?;
        self.validate_invitation(&code.invitation_id).await
    }

    /// Fetch an invitation by id and check it is currently redeemable.
    #[instrument(skip(self))]
    pub async fn validate_invitation(&self, invitation_id: &str) -> Result<Invitation, CheckInError> {
        let invitation = self
            .invitations
            .fetch(invitation_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Error getting invitation");
                CheckInError::StoreUnavailable
            })?
            .ok_or(CheckInError::InvitationNotFound)?;

        if !is_redeemable(&invitation, self.now()) {
            tracing::info!(
                is_active = invitation.is_active,
                used_count = invitation.used_count,
                max_visitors = invitation.max_visitors,
                "Invitation is not redeemable"
            );
            return Err(CheckInError::InvitationNotRedeemable);
        }

        Ok(invitation)
    }

    /// Consume one use of `invitation`.
    ///
    /// Every rejection, whatever its cause, is reported to the visitor as the
    /// same [`CheckInError::RedemptionRejected`]; the cause is only logged.
    #[instrument(skip(self, invitation), fields(invitation_id = %invitation.id))]
    pub async fn redeem(&self, invitation: &Invitation) -> Result<i32, CheckInError> {
        match self.invitations.redeem(&invitation.id, self.now()).await {
            Ok(Redemption::Redeemed { used_count }) => {
                tracing::info!(used_count, max_visitors = invitation.max_visitors, "Invitation redeemed");
                Ok(used_count)
            }
            Ok(Redemption::Rejected(reason)) => {
                tracing::warn!(?reason, "Invitation redemption rejected");
                Err(CheckInError::RedemptionRejected)
            }
            Err(e) => {
                tracing::error!(error = %e, "Error using invitation");
                Err(CheckInError::RedemptionRejected)
            }
        }
    }

    /// Build and write the visitor record for a redeemed invitation.
    #[instrument(skip(self, invitation, form), fields(invitation_id = %invitation.id))]
    pub async fn persist(
        &self,
        invitation: &Invitation,
        form: ValidatedForm,
    ) -> Result<VisitorRecord, CheckInError> {
        let visitor = VisitorRecord::checked_in(invitation, form, self.now());

        if let Err(e) = self.visitors.insert_visitor(&visitor).await {
            tracing::error!(
                visitor_id = %visitor.id,
                error = %e,
                "Visitor record not saved; invitation use remains consumed"
            );
            return Err(CheckInError::PersistenceFailure);
        }

        tracing::info!(visitor_id = %visitor.id, "Visitor checked in");
        Ok(visitor)
    }

    /// Send guard and host notifications. Never fails.
    pub async fn notify(&self, visitor: &VisitorRecord) -> DispatchReport {
        self.dispatcher.dispatch(visitor, self.now()).await
    }

    /// Run form validation, redemption, persistence and notification.
    ///
    /// `invitation` is the snapshot obtained from [`Registrar::validate_scan`]
    /// or [`Registrar::validate_invitation`]. A blank name is rejected before
    /// the invitation is touched.
    pub async fn register(
        &self,
        invitation: &Invitation,
        form: RegistrationForm,
    ) -> Result<VisitorRecord, CheckInError> {
        let form = form.validate()?;

        self.redeem(invitation).await?;
        let visitor = self.persist(invitation, form).await?;
        self.notify(&visitor).await;

        Ok(visitor)
    }
}
