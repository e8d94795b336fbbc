//! Kiosk session state machine driven end to end with a fake camera.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{fixed_now, form, invitation, qr_payload, registrar};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use visitor_checkin_server::{
    error::CheckInError,
    models::visitor::RegistrationForm,
    session::{
        CheckInSession, Phase, Screen, Severity,
        scanner::{CameraFacing, ScanConfig, ScanEvent, Scanner, ScannerError},
    },
    store::{InvitationStore, memory::MemoryStore},
};

/// Camera stand-in that replays scripted events on start.
#[derive(Default)]
struct FakeScanner {
    script: Vec<ScanEvent>,
    fail_start: bool,
    close_after_script: bool,
    starts: usize,
    stops: usize,
    sender: Option<mpsc::UnboundedSender<ScanEvent>>,
}

impl FakeScanner {
    fn decoding(text: &str) -> Self {
        Self {
            script: vec![
                ScanEvent::Error("No QR code found".into()),
                ScanEvent::Decoded(text.to_string()),
            ],
            ..Default::default()
        }
    }

    fn running(&self) -> bool {
        self.starts > self.stops
    }
}

impl Scanner for FakeScanner {
    fn start(
        &mut self,
        facing: CameraFacing,
        _config: &ScanConfig,
        events: mpsc::UnboundedSender<ScanEvent>,
    ) -> Result<(), ScannerError> {
        assert_eq!(facing, CameraFacing::Environment);
        if self.fail_start {
            return Err(ScannerError::Unavailable("NotAllowedError".into()));
        }
        self.starts += 1;
        for event in self.script.drain(..) {
            let _ = events.send(event);
        }
        if !self.close_after_script {
            self.sender = Some(events);
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ScannerError> {
        self.stops += 1;
        self.sender = None;
        Ok(())
    }
}

async fn setup(max_visitors: i32) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .insert_invitation(invitation("inv1", max_visitors, 0))
        .await;
    store
}

#[tokio::test]
async fn scan_register_and_reset() {
    let store = setup(1).await;
    let registrar = registrar(&store);
    let mut scanner = FakeScanner::decoding(&qr_payload("inv1"));
    let mut session = CheckInSession::new();

    let phase = session
        .scan(&registrar, &mut scanner, &ScanConfig::default(), &CancellationToken::new())
        .await;

    assert_eq!(phase, Phase::AwaitingForm);
    assert_eq!(session.screen(), Screen::RegistrationForm);
    assert_eq!(session.invitation().unwrap().host_name, "Asha Rao");
    assert!(!scanner.running());

    let phase = session.submit(&registrar, form("Ravi Kumar")).await;

    assert_eq!(phase, Phase::Success);
    assert_eq!(session.screen(), Screen::Success);
    let visitor = session.visitor().unwrap();
    assert_eq!(visitor.name, "Ravi Kumar");
    assert_eq!(visitor.check_in_time, fixed_now());
    let toast = session.take_toast().unwrap();
    assert_eq!(toast.severity, Severity::Success);
    assert_eq!(toast.ttl, Duration::from_secs(5));

    assert_eq!(store.visitors().await.len(), 1);
    assert_eq!(store.notification_attempts(), 2);

    assert_eq!(session.reset(), Phase::Idle);
    assert_eq!(session.screen(), Screen::Welcome);
    assert!(session.invitation().is_none());
    assert!(session.visitor().is_none());
}

#[tokio::test]
async fn other_payload_type_is_malformed_not_missing() {
    let store = setup(1).await;
    let registrar = registrar(&store);
    let mut scanner = FakeScanner::decoding(r#"{"type":"other_thing"}"#);
    let mut session = CheckInSession::new();

    let phase = session
        .scan(&registrar, &mut scanner, &ScanConfig::default(), &CancellationToken::new())
        .await;

    assert_eq!(phase, Phase::Error);
    assert_eq!(session.error(), Some(&CheckInError::MalformedCode));
    assert_eq!(session.take_toast().unwrap().text, "Invalid QR code format");
    assert_eq!(store.fetch_calls(), 0);
    assert!(!scanner.running());
}

#[tokio::test]
async fn cancelling_a_scan_returns_to_idle_and_releases_camera() {
    let store = setup(1).await;
    let registrar = registrar(&store);
    let mut scanner = FakeScanner::default();
    let mut session = CheckInSession::new();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let phase = session
        .scan(&registrar, &mut scanner, &ScanConfig::default(), &cancel)
        .await;

    assert_eq!(phase, Phase::Idle);
    assert_eq!(scanner.starts, 1);
    assert_eq!(scanner.stops, 1);
    assert_eq!(store.fetch_calls(), 0);
}

#[tokio::test]
async fn scanner_closing_without_a_code_returns_to_idle() {
    let store = setup(1).await;
    let registrar = registrar(&store);
    let mut scanner = FakeScanner {
        close_after_script: true,
        ..Default::default()
    };
    let mut session = CheckInSession::new();

    let phase = session
        .scan(&registrar, &mut scanner, &ScanConfig::default(), &CancellationToken::new())
        .await;

    assert_eq!(phase, Phase::Idle);
    assert!(!scanner.running());
}

#[tokio::test]
async fn camera_failure_surfaces_an_error() {
    let store = setup(1).await;
    let registrar = registrar(&store);
    let mut scanner = FakeScanner {
        fail_start: true,
        ..Default::default()
    };
    let mut session = CheckInSession::new();

    let phase = session
        .scan(&registrar, &mut scanner, &ScanConfig::default(), &CancellationToken::new())
        .await;

    assert_eq!(phase, Phase::Error);
    assert_eq!(session.error(), Some(&CheckInError::ScannerUnavailable));
    assert_eq!(
        session.take_toast().unwrap().text,
        "Failed to start camera. Please check permissions."
    );
    assert_eq!(scanner.stops, 0);
}

#[tokio::test]
async fn empty_name_stays_on_form_without_redeeming() {
    let store = setup(1).await;
    let registrar = registrar(&store);
    let mut scanner = FakeScanner::decoding(&qr_payload("inv1"));
    let mut session = CheckInSession::new();
    session
        .scan(&registrar, &mut scanner, &ScanConfig::default(), &CancellationToken::new())
        .await;

    let phase = session
        .submit(&registrar, RegistrationForm::default())
        .await;

    assert_eq!(phase, Phase::AwaitingForm);
    assert_eq!(
        session.field_error(),
        Some(&CheckInError::MissingRequiredField { field: "name" })
    );
    assert_eq!(store.redeem_calls(), 0);

    // Correcting the form clears the field error
    assert_eq!(session.submit(&registrar, form("Ravi")).await, Phase::Success);
    assert!(session.field_error().is_none());
}

#[tokio::test]
async fn losing_the_race_shows_generic_rejection_and_allows_retry() {
    let store = setup(1).await;
    let registrar = registrar(&store);
    let mut scanner = FakeScanner::decoding(&qr_payload("inv1"));
    let mut session = CheckInSession::new();
    session
        .scan(&registrar, &mut scanner, &ScanConfig::default(), &CancellationToken::new())
        .await;

    // Another kiosk redeems the last use in between
    store.redeem("inv1", fixed_now()).await.unwrap();

    let phase = session.submit(&registrar, form("Ravi")).await;

    assert_eq!(phase, Phase::Error);
    assert_eq!(session.error(), Some(&CheckInError::RedemptionRejected));
    assert_eq!(
        session.take_toast().unwrap().text,
        "Failed to validate invitation"
    );
    assert_eq!(store.invitation("inv1").await.unwrap().used_count, 1);

    assert_eq!(session.retry(), Phase::AwaitingForm);
    assert!(session.invitation().is_some());
    assert!(session.error().is_none());
}

#[tokio::test]
async fn persistence_failure_moves_to_error_with_slot_consumed() {
    let store = setup(2).await;
    let registrar = registrar(&store);
    let mut scanner = FakeScanner::decoding(&qr_payload("inv1"));
    let mut session = CheckInSession::new();
    session
        .scan(&registrar, &mut scanner, &ScanConfig::default(), &CancellationToken::new())
        .await;

    store.fail_visitor_writes(true);
    let phase = session.submit(&registrar, form("Ravi")).await;

    assert_eq!(phase, Phase::Error);
    assert_eq!(session.error(), Some(&CheckInError::PersistenceFailure));
    assert_eq!(store.invitation("inv1").await.unwrap().used_count, 1);
    assert_eq!(store.notification_attempts(), 0);
}

#[tokio::test]
async fn actions_out_of_order_are_ignored() {
    let store = setup(1).await;
    let registrar = registrar(&store);
    let mut session = CheckInSession::new();

    assert_eq!(session.submit(&registrar, form("Ravi")).await, Phase::Idle);
    assert_eq!(session.retry(), Phase::Idle);
    assert_eq!(store.redeem_calls(), 0);

    let mut scanner = FakeScanner::decoding(&qr_payload("inv1"));
    session
        .scan(&registrar, &mut scanner, &ScanConfig::default(), &CancellationToken::new())
        .await;
    let mut second = FakeScanner::decoding(&qr_payload("inv1"));
    let phase = session
        .scan(&registrar, &mut second, &ScanConfig::default(), &CancellationToken::new())
        .await;

    assert_eq!(phase, Phase::AwaitingForm);
    assert_eq!(second.starts, 0);
}
