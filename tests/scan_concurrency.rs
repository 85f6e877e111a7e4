//! Overlapping captures under each concurrency policy.
//!
//! The scripted recognizer parks every call until the test answers it, so
//! completion order is fully controlled.

mod scan_helpers;

use lens_ocr_lib::output::SharedOutput;
use lens_ocr_lib::{ConcurrencyPolicy, Scanner, Settings};
use scan_helpers::{FakeDevices, ScriptedRecognizer};
use std::sync::Arc;

async fn started_scanner(policy: ConcurrencyPolicy) -> (
    Scanner,
    SharedOutput,
    tokio::sync::mpsc::UnboundedReceiver<scan_helpers::PendingCall>,
) {
    let (recognizer, calls) = ScriptedRecognizer::new();
    let output = SharedOutput::new();
    let settings = Settings {
        concurrency: policy,
        ..Settings::default()
    };
    let scanner = Scanner::new(
        FakeDevices::granted(),
        recognizer,
        Arc::new(output.clone()),
        &settings,
    );
    scanner.start().await.unwrap();
    (scanner, output, calls)
}

#[tokio::test]
async fn last_completion_wins_by_default() {
    let (scanner, output, mut calls) = started_scanner(ConcurrencyPolicy::default()).await;

    let first_handle = scanner.capture().unwrap();
    let first = calls.recv().await.unwrap();
    let second_handle = scanner.capture().unwrap();
    let second = calls.recv().await.unwrap();
    assert_eq!(scanner.in_flight(), 2);

    // Second trigger completes first...
    second.succeed("SECOND");
    second_handle.await.unwrap();
    assert_eq!(output.text(), "SECOND");

    // ...then the first one lands and overwrites it.
    first.succeed("FIRST");
    first_handle.await.unwrap();
    assert_eq!(output.text(), "FIRST");
    assert_eq!(output.write_count(), 2);
    assert_eq!(scanner.in_flight(), 0);
}

#[tokio::test]
async fn last_completion_applies_to_failures_too() {
    let (scanner, output, mut calls) = started_scanner(ConcurrencyPolicy::LastCompletion).await;

    let h1 = scanner.capture().unwrap();
    let c1 = calls.recv().await.unwrap();
    let h2 = scanner.capture().unwrap();
    let c2 = calls.recv().await.unwrap();

    c1.succeed("readable");
    h1.await.unwrap();
    c2.fail();
    h2.await.unwrap();
    assert_eq!(output.text(), "Error processing the image.");
}

#[tokio::test]
async fn single_flight_ignores_triggers_while_busy() {
    let (scanner, output, mut calls) = started_scanner(ConcurrencyPolicy::SingleFlight).await;

    let handle = scanner.capture().unwrap();
    let pending = calls.recv().await.unwrap();
    assert!(scanner.capture().is_none(), "second trigger must be ignored");
    assert_eq!(scanner.in_flight(), 1);

    pending.succeed("ONLY");
    handle.await.unwrap();
    assert_eq!(output.text(), "ONLY");
    assert_eq!(scanner.in_flight(), 0);

    // Slot is free again.
    let handle = scanner.capture().unwrap();
    calls.recv().await.unwrap().succeed("NEXT");
    handle.await.unwrap();
    assert_eq!(output.text(), "NEXT");
}

#[tokio::test]
async fn latest_trigger_discards_superseded_results() {
    let (scanner, output, mut calls) = started_scanner(ConcurrencyPolicy::LatestTrigger).await;

    let first_handle = scanner.capture().unwrap();
    let first = calls.recv().await.unwrap();
    let second_handle = scanner.capture().unwrap();
    let second = calls.recv().await.unwrap();

    second.succeed("SECOND");
    second_handle.await.unwrap();
    first.succeed("FIRST");
    first_handle.await.unwrap();

    assert_eq!(output.text(), "SECOND");
    assert_eq!(output.write_count(), 1);
}

#[tokio::test]
async fn identical_frames_encode_identically() {
    let (scanner, _output, mut calls) = started_scanner(ConcurrencyPolicy::LastCompletion).await;

    let h1 = scanner.capture().unwrap();
    let c1 = calls.recv().await.unwrap();
    let h2 = scanner.capture().unwrap();
    let c2 = calls.recv().await.unwrap();

    assert!(c1.image.as_data_url().starts_with("data:image/png;base64,"));
    assert_eq!(c1.image, c2.image, "same frame content encodes identically");

    c1.succeed("a");
    c2.succeed("b");
    h1.await.unwrap();
    h2.await.unwrap();
}
