//! Best-effort notification fan-out after a check-in.
//!
//! # Error Handling
//!
//! - Both writes are issued concurrently and are independent of each other
//! - Each write is bounded by a timeout
//! - Failures are logged and never retried or propagated; the check-in has
//!   already been recorded by the time notifications go out

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::CheckInError;
use crate::models::{notification::Notification, visitor::VisitorRecord};
use crate::store::NotificationStore;

/// Outcome of one dispatch, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchReport {
    pub attempted: usize,
    pub delivered: usize,
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    store: Arc<dyn NotificationStore>,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(store: Arc<dyn NotificationStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Notify the guard desk and the host about `visitor`.
    pub async fn dispatch(&self, visitor: &VisitorRecord, now: DateTime<Utc>) -> DispatchReport {
        let guard = Notification::visitor_logged(visitor, now);
        let host = Notification::visitor_checked_in(visitor, now);

        let (guard_sent, host_sent) = tokio::join!(self.send(&guard), self.send(&host));

        let report = DispatchReport {
            attempted: 2,
            delivered: usize::from(guard_sent) + usize::from(host_sent),
        };

        if report.delivered == report.attempted {
            tracing::info!(visitor_id = %visitor.id, "Notifications sent successfully");
        } else {
            tracing::warn!(
                visitor_id = %visitor.id,
                delivered = report.delivered,
                attempted = report.attempted,
                "Some notifications were not delivered"
            );
        }

        report
    }

    async fn send(&self, notification: &Notification) -> bool {
        let outcome =
            tokio::time::timeout(self.timeout, self.store.append_notification(notification)).await;

        match outcome {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::error!(
                    notification_type = notification.kind.as_str(),
                    visitor_id = %notification.visitor_id,
                    error = %e,
                    "{}",
                    CheckInError::NotificationFailure
                );
                false
            }
            Err(_) => {
                tracing::error!(
                    notification_type = notification.kind.as_str(),
                    visitor_id = %notification.visitor_id,
                    timeout_secs = self.timeout.as_secs(),
                    "{}: timed out",
                    CheckInError::NotificationFailure
                );
                false
            }
        }
    }
}
