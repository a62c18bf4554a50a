//! End-to-end tests of the submission pipeline over deterministic doubles.
//!
//! Covers the pipeline's contract: code shape, uniqueness under
//! concurrency, race-safe lazy counter seeding, the bounded retry policy
//! (collisions only), the license pre-check, and the no-render-retry rule.

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect

use registration::{MAX_ATTEMPTS, SubmissionError, SubmissionRequest, SubmissionService};
use startline_core::entry::SequenceName;
use startline_core::record::RecordStore;
use startline_core::renderer::{FormRenderer, RenderError};
use startline_core::sequence::{SequenceSeeder, SequenceStore, SequenceStoreError, ZeroSeeder};
use startline_testing::{
    CollidingRecordStore, FailingRenderer, InMemoryRecordStore, InMemorySequenceStore,
    ScriptedRenderer, test_clock,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

fn request(first_name: &str, license_no: Option<&str>) -> SubmissionRequest {
    SubmissionRequest {
        first_name: first_name.to_string(),
        last_name: "Kovacs".to_string(),
        birth_date: "2010-03-14".to_string(),
        club: Some("Falcons".to_string()),
        category: "cadet".to_string(),
        age: "15".to_string(),
        weight_kg: "52.5".to_string(),
        license_no: license_no.map(str::to_string),
    }
}

fn service(
    sequences: &Arc<InMemorySequenceStore>,
    records: Arc<dyn RecordStore>,
    renderer: Arc<dyn FormRenderer>,
) -> SubmissionService {
    SubmissionService::new(
        Arc::clone(sequences) as Arc<dyn SequenceStore>,
        records,
        renderer,
        Arc::new(test_clock()),
    )
}

fn in_memory_sequences() -> Arc<InMemorySequenceStore> {
    Arc::new(InMemorySequenceStore::new(Arc::new(ZeroSeeder)))
}

#[tokio::test]
async fn successful_codes_match_the_prefixed_six_digit_shape() {
    let sequences = in_memory_sequences();
    let service = service(
        &sequences,
        Arc::new(InMemoryRecordStore::new()),
        Arc::new(ScriptedRenderer::new(vec![])),
    );

    for _ in 0..3 {
        let receipt = service.submit(request("Anna", None)).await.expect("submit failed");
        let code = receipt.entry_code.as_str();
        let (prefix, digits) = code.rsplit_once('-').expect("code has no dash");
        assert_eq!(prefix, "CAD");
        assert_eq!(digits.len(), 6);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }
}

#[tokio::test]
async fn concurrent_submissions_never_share_a_code() {
    let sequences = in_memory_sequences();
    let records = Arc::new(InMemoryRecordStore::new());
    let service = Arc::new(service(
        &sequences,
        records.clone(),
        Arc::new(ScriptedRenderer::new(vec![])),
    ));

    let mut handles = Vec::new();
    for i in 0..32 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service.submit(request(&format!("Participant{i}"), None)).await
        }));
    }

    let mut codes = std::collections::HashSet::new();
    for handle in handles {
        let receipt = handle.await.expect("task panicked").expect("submit failed");
        assert!(
            codes.insert(receipt.entry_code.clone()),
            "entry code {} issued twice",
            receipt.entry_code
        );
    }
    assert_eq!(codes.len(), 32);
    assert_eq!(records.len(), 32);
}

/// Seeder with a fixed starting point, standing in for a scan of imported
/// historical records.
struct FixedSeeder(u64);

impl SequenceSeeder for FixedSeeder {
    fn initial_value(
        &self,
        _name: SequenceName,
    ) -> Pin<Box<dyn Future<Output = Result<u64, SequenceStoreError>> + Send + '_>> {
        let value = self.0;
        Box::pin(async move {
            // Widen the first-use race window.
            tokio::task::yield_now().await;
            Ok(value)
        })
    }
}

#[tokio::test]
async fn first_allocation_returns_seed_plus_one() {
    let sequences = InMemorySequenceStore::new(Arc::new(FixedSeeder(100)));
    let name = SequenceName::new("cadet_entries");

    assert_eq!(sequences.next_value(name.clone()).await, Ok(101));
    assert_eq!(sequences.next_value(name).await, Ok(102));
}

#[tokio::test]
async fn racing_first_allocations_get_distinct_values() {
    let sequences = Arc::new(InMemorySequenceStore::new(Arc::new(FixedSeeder(100))));
    let name = SequenceName::new("cadet_entries");

    let a = {
        let sequences = Arc::clone(&sequences);
        let name = name.clone();
        tokio::spawn(async move { sequences.next_value(name).await })
    };
    let b = {
        let sequences = Arc::clone(&sequences);
        let name = name.clone();
        tokio::spawn(async move { sequences.next_value(name).await })
    };

    let a = a.await.expect("task panicked").expect("allocation failed");
    let b = b.await.expect("task panicked").expect("allocation failed");
    assert_ne!(a, b);
    assert_eq!(a.min(b), 101);
    assert_eq!(a.max(b), 102);
}

#[tokio::test]
async fn collisions_exhaust_after_exactly_three_attempts() {
    let sequences = in_memory_sequences();
    let records = Arc::new(CollidingRecordStore::new());
    let renderer = Arc::new(ScriptedRenderer::new(vec![]));
    let service = service(&sequences, records.clone(), renderer.clone());

    let error = service.submit(request("Anna", None)).await.unwrap_err();
    assert!(matches!(
        error,
        SubmissionError::CollisionExhausted { attempts: MAX_ATTEMPTS }
    ));

    // Three full attempts ran: three insert tries, three renders, and three
    // counter values consumed (all now gaps).
    assert_eq!(records.attempts(), 3);
    assert_eq!(renderer.calls(), 3);
    assert_eq!(sequences.allocations(), 3);
    assert_eq!(
        sequences
            .current_value(&SequenceName::new("cadet_entries"))
            .await,
        Some(3)
    );
}

#[tokio::test]
async fn duplicate_license_is_rejected_before_any_allocation() {
    let sequences = in_memory_sequences();
    let records = Arc::new(InMemoryRecordStore::new());
    let service = service(
        &sequences,
        records.clone(),
        Arc::new(ScriptedRenderer::new(vec![])),
    );

    service
        .submit(request("Anna", Some("HUN-1234")))
        .await
        .expect("first licensed submission failed");
    let consumed_after_first = sequences.allocations();

    let error = service
        .submit(request("Bence", Some("HUN-1234")))
        .await
        .unwrap_err();
    assert!(matches!(error, SubmissionError::DuplicateLicense { .. }));
    assert_eq!(error.kind(), "validation_error");

    // The rejection consumed nothing: no counter value, no record.
    assert_eq!(sequences.allocations(), consumed_after_first);
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn malformed_numbers_are_rejected_before_any_allocation() {
    let sequences = in_memory_sequences();
    let renderer = Arc::new(ScriptedRenderer::new(vec![]));
    let service = service(
        &sequences,
        Arc::new(InMemoryRecordStore::new()),
        renderer.clone(),
    );

    let mut bad = request("Anna", None);
    bad.age = "fifteen".to_string();

    let error = service.submit(bad).await.unwrap_err();
    assert!(matches!(error, SubmissionError::Validation(_)));
    assert_eq!(sequences.allocations(), 0);
    assert_eq!(renderer.calls(), 0);
}

#[tokio::test]
async fn blank_licenses_do_not_conflict_with_each_other() {
    let sequences = in_memory_sequences();
    let records = Arc::new(InMemoryRecordStore::new());
    let service = service(
        &sequences,
        records.clone(),
        Arc::new(ScriptedRenderer::new(vec![])),
    );

    let first = service.submit(request("Anna", None)).await;
    let second = service.submit(request("Bence", Some("   "))).await;
    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn rendering_is_never_retried_by_the_pipeline() {
    let sequences = in_memory_sequences();
    let records = Arc::new(InMemoryRecordStore::new());
    // Fails on the first call, would succeed on a second one.
    let renderer = Arc::new(ScriptedRenderer::new(vec![Err(RenderError::Failed {
        message: "layout engine offline".to_string(),
    })]));
    let service = service(&sequences, records.clone(), renderer.clone());

    let error = service.submit(request("Anna", None)).await.unwrap_err();
    assert!(matches!(error, SubmissionError::Rendering(_)));
    assert_eq!(error.kind(), "rendering_error");

    // Exactly one render call: the pipeline did not consume the stub's
    // would-succeed second outcome. One counter value was already consumed
    // and stays a gap; nothing was persisted.
    assert_eq!(renderer.calls(), 1);
    assert_eq!(sequences.allocations(), 1);
    assert!(records.is_empty());

    // A manual retry by the client goes through and gets a fresh code.
    let receipt = service
        .submit(request("Anna", None))
        .await
        .expect("manual retry failed");
    assert_eq!(receipt.entry_code.as_str(), "CAD-000002");
    assert_eq!(renderer.calls(), 2);
}

#[tokio::test]
async fn rendering_failure_never_orphans_a_record() {
    let sequences = in_memory_sequences();
    let records = Arc::new(InMemoryRecordStore::new());
    let service = service(
        &sequences,
        records.clone(),
        Arc::new(FailingRenderer::new("printer on fire")),
    );

    let error = service.submit(request("Anna", None)).await.unwrap_err();
    assert!(matches!(error, SubmissionError::Rendering(_)));
    assert!(records.is_empty());
}

#[tokio::test]
async fn receipts_serialize_with_stable_fields() {
    let sequences = in_memory_sequences();
    let service = service(
        &sequences,
        Arc::new(InMemoryRecordStore::new()),
        Arc::new(ScriptedRenderer::new(vec![])),
    );

    let receipt = service
        .submit(request("Anna", Some("HUN-1234")))
        .await
        .expect("submit failed");
    let json = serde_json::to_value(&receipt).expect("receipt must serialize");

    assert_eq!(json["entry_code"], "CAD-000001");
    assert_eq!(json["form_file"], "form_CAD-000001.png");
    assert_eq!(json["record"]["registration"]["license_no"], "HUN-1234");
}
