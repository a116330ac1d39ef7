mod common;

use common::{Segment, ScriptedTransport};
use search_export::controller::{ControllerStatus, SessionController, SessionReport};
use search_export::export::TimeRange;
use search_export::session::SessionOutcome;
use std::time::Duration;
use tokio::sync::mpsc;

async fn next_report(rx: &mut mpsc::Receiver<SessionReport>) -> SessionReport {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for session report")
        .expect("report channel closed")
}

#[tokio::test]
async fn test_submit_publishes_completed_records() {
    let transport = ScriptedTransport::new(vec![Segment::last(vec![
        ("t1", "first"),
        ("t2", "second"),
    ])]);
    let (report_tx, mut report_rx) = mpsc::channel(4);
    let mut controller = SessionController::new(transport.clone(), report_tx);
    assert_eq!(controller.status(), ControllerStatus::Idle);

    let id = controller.submit("error OR warn", TimeRange::all_time()).await;
    let report = next_report(&mut report_rx).await;

    assert_eq!(report.session_id, id);
    assert_eq!(report.query.text(), "search error OR warn");
    let labels: Vec<String> = report
        .outcome
        .records()
        .unwrap()
        .iter()
        .map(|r| format!("{}\t{}", r.label(), r.text))
        .collect();
    assert_eq!(labels, vec!["1-t1\tfirst", "2-t2\tsecond"]);

    controller.wait().await;
    assert_eq!(controller.status(), ControllerStatus::Idle);
    assert!(!controller.is_running());
}

#[tokio::test]
async fn test_failure_is_reported_with_error_text() {
    let transport = ScriptedTransport::new(vec![Segment::Fail {
        status: 503,
        text: "search head is busy",
    }]);
    let (report_tx, mut report_rx) = mpsc::channel(4);
    let mut controller = SessionController::new(transport, report_tx);

    controller.submit("foo", TimeRange::all_time()).await;
    let report = next_report(&mut report_rx).await;

    let err = report.outcome.error().expect("session should fail");
    assert!(err.to_string().contains("search head is busy"));
    controller.wait().await;
    assert_eq!(controller.status(), ControllerStatus::Idle);
}

#[tokio::test]
async fn test_cancel_signals_cancelling_and_reports_cancelled() {
    // The third stream never ends, parking the session mid-drain
    let transport = ScriptedTransport::new(vec![
        Segment::partial(vec![("t1", "a")]),
        Segment::partial(vec![("t2", "b")]),
        Segment::Hang,
    ]);
    let (report_tx, mut report_rx) = mpsc::channel(4);
    let mut controller = SessionController::new(transport.clone(), report_tx);
    let mut status_rx = controller.subscribe();

    controller.submit("foo", TimeRange::all_time()).await;
    assert_eq!(*status_rx.borrow_and_update(), ControllerStatus::Searching);

    // Wait until the session is parked on the hanging third stream
    while transport.opens() < 3 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert!(controller.cancel());
    assert_eq!(controller.status(), ControllerStatus::Cancelling);

    // Cancellation is not honored mid-drain; superseding forces it.
    controller.submit("bar", TimeRange::all_time()).await;

    let superseded = next_report(&mut report_rx).await;
    assert!(matches!(superseded.outcome, SessionOutcome::Cancelled));
    assert_eq!(superseded.query.text(), "search foo");
    assert_eq!(transport.released(), 3, "hanging stream released on supersede");

    // Script is exhausted, so the replacement session fails
    let replacement = next_report(&mut report_rx).await;
    assert_eq!(replacement.query.text(), "search bar");
    assert!(replacement.outcome.error().is_some());
}

#[tokio::test]
async fn test_abort_stops_session_stuck_after_cancel() {
    let transport = ScriptedTransport::new(vec![Segment::Hang]);
    let (report_tx, mut report_rx) = mpsc::channel(1);
    let mut controller = SessionController::new(transport.clone(), report_tx);

    let id = controller.submit("foo", TimeRange::all_time()).await;
    while transport.opens() < 1 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    // Cancellation alone leaves the hanging stream draining
    assert!(controller.cancel());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(controller.is_running());
    assert_eq!(controller.status(), ControllerStatus::Cancelling);

    controller.abort().await;

    let report = next_report(&mut report_rx).await;
    assert_eq!(report.session_id, id);
    assert!(matches!(report.outcome, SessionOutcome::Cancelled));
    assert_eq!(controller.status(), ControllerStatus::Idle);
    assert!(!controller.is_running());
    assert_eq!(transport.released(), 1);
    assert_eq!(transport.opens(), 1);
}

#[tokio::test]
async fn test_abort_without_running_session_is_noop() {
    let transport = ScriptedTransport::new(vec![]);
    let (report_tx, mut report_rx) = mpsc::channel(1);
    let mut controller = SessionController::new(transport, report_tx);

    controller.abort().await;

    assert_eq!(controller.status(), ControllerStatus::Idle);
    assert!(report_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_cancel_without_running_session_is_noop() {
    let transport = ScriptedTransport::new(vec![Segment::Hang]);
    let (report_tx, _report_rx) = mpsc::channel(4);
    let controller = SessionController::new(transport.clone(), report_tx);

    assert!(!controller.cancel());
    assert_eq!(controller.status(), ControllerStatus::Idle);
    drop(controller);
    assert_eq!(transport.opens(), 0);
}

#[tokio::test]
async fn test_resubmit_after_completion_starts_fresh_numbering() {
    let transport = ScriptedTransport::new(vec![
        Segment::last(vec![("t1", "a"), ("t2", "b")]),
        Segment::last(vec![("t3", "c")]),
    ]);
    let (report_tx, mut report_rx) = mpsc::channel(4);
    let mut controller = SessionController::new(transport, report_tx);

    controller.submit("first", TimeRange::all_time()).await;
    let first = next_report(&mut report_rx).await;
    assert_eq!(first.outcome.records().unwrap().len(), 2);

    controller.submit("second", TimeRange::all_time()).await;
    let second = next_report(&mut report_rx).await;
    let records = second.outcome.records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].sequence_number, 1);
}
