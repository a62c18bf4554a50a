//! Self-contained pipeline demo over in-memory stores.
//!
//! Exercises the happy path, the duplicate-license rejection, and the
//! no-render-retry rule without needing a database. Run with:
//! `cargo run --bin demo`

use registration::{MockFormRenderer, SubmissionRequest, SubmissionService};
use startline_core::sequence::ZeroSeeder;
use startline_testing::{FailingRenderer, InMemoryRecordStore, InMemorySequenceStore, test_clock};
use std::sync::Arc;

fn request(first_name: &str, category: &str, license_no: Option<&str>) -> SubmissionRequest {
    SubmissionRequest {
        first_name: first_name.to_string(),
        last_name: "Demo".to_string(),
        birth_date: "2010-03-14".to_string(),
        club: Some("Falcons".to_string()),
        category: category.to_string(),
        age: "15".to_string(),
        weight_kg: "52.5".to_string(),
        license_no: license_no.map(str::to_string),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
        .init();

    let sequences = Arc::new(InMemorySequenceStore::new(Arc::new(ZeroSeeder)));
    let records = Arc::new(InMemoryRecordStore::new());
    let service = SubmissionService::new(
        sequences.clone(),
        records.clone(),
        Arc::new(MockFormRenderer::new("forms")),
        Arc::new(test_clock()),
    );

    // Two categories number independently; blank licenses never collide.
    for (name, category) in [("Anna", "cadet"), ("Bence", "cadet"), ("Csilla", "senior")] {
        match service.submit(request(name, category, None)).await {
            Ok(receipt) => println!("{name}: committed as {}", receipt.entry_code),
            Err(error) => println!("{name}: {} ({})", error, error.kind()),
        }
    }

    // A licensed entry, then a duplicate of it: the second is rejected
    // before consuming a counter value.
    let before = sequences.allocations();
    let licensed = service
        .submit(request("Dora", "junior", Some("HUN-1234")))
        .await;
    let duplicate = service
        .submit(request("Elek", "junior", Some("HUN-1234")))
        .await;
    println!(
        "Dora: {:?}, Elek: {:?}, allocations consumed: {}",
        licensed.map(|r| r.entry_code.into_inner()),
        duplicate.map(|r| r.entry_code.into_inner()),
        sequences.allocations() - before
    );

    // Rendering failures abort the submission and are never retried; the
    // allocated value stays behind as a numbering gap.
    let failing = SubmissionService::new(
        sequences.clone(),
        records.clone(),
        Arc::new(FailingRenderer::new("layout engine offline")),
        Arc::new(test_clock()),
    );
    match failing.submit(request("Ferenc", "cadet", None)).await {
        Ok(receipt) => println!("Ferenc: committed as {}", receipt.entry_code),
        Err(error) => println!("Ferenc: {} ({})", error, error.kind()),
    }

    println!(
        "records persisted: {}, counter values consumed: {}",
        records.len(),
        sequences.allocations()
    );
}
