//! In-memory store and renderer doubles.
//!
//! Provides fast, deterministic implementations of the core pipeline traits:
//! - [`InMemorySequenceStore`]: per-namespace counters with lazy seeding
//! - [`InMemoryRecordStore`]: enforces both uniqueness invariants with
//!   tagged conflicts, like the production store
//! - [`CollidingRecordStore`]: reports an entry-code conflict on every
//!   insert, for retry-exhaustion tests
//! - [`ScriptedRenderer`] / [`FailingRenderer`]: renderer stubs with
//!   programmable outcomes

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Test utilities document panics where critical

use chrono::{DateTime, Utc};
use startline_core::entry::{EntryCode, SequenceName};
use startline_core::record::{
    NewRegistration, RecordStore, RecordStoreError, RegistrationRecord,
};
use startline_core::renderer::{FormRenderer, RenderError, RenderResult, RenderedForm};
use startline_core::sequence::{SequenceSeeder, SequenceStore, SequenceStoreError};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex, RwLock};
use tokio::sync::Mutex;

/// In-memory sequence store with lazy, race-safe seeding.
///
/// Counters live behind a single async mutex, which serializes first-use
/// seeding the same way the production store's `INSERT … ON CONFLICT`
/// creation path does: two concurrent first-calls can never observe the
/// same value.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use startline_core::entry::SequenceName;
/// use startline_core::sequence::{SequenceStore, ZeroSeeder};
/// use startline_testing::InMemorySequenceStore;
///
/// # async fn example() {
/// let store = InMemorySequenceStore::new(Arc::new(ZeroSeeder));
/// let name = SequenceName::new("cadet_entries");
/// assert_eq!(store.next_value(name.clone()).await, Ok(1));
/// assert_eq!(store.next_value(name).await, Ok(2));
/// # }
/// ```
#[derive(Clone)]
pub struct InMemorySequenceStore {
    counters: Arc<Mutex<HashMap<SequenceName, u64>>>,
    seeder: Arc<dyn SequenceSeeder>,
    allocations: Arc<AtomicUsize>,
}

impl InMemorySequenceStore {
    /// Create a new empty store with the given seeder.
    #[must_use]
    pub fn new(seeder: Arc<dyn SequenceSeeder>) -> Self {
        Self {
            counters: Arc::new(Mutex::new(HashMap::new())),
            seeder,
            allocations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of values consumed across all namespaces.
    ///
    /// Useful for asserting that a code path did (or did not) allocate.
    #[must_use]
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }

    /// Current value of a namespace, if it has been materialized.
    pub async fn current_value(&self, name: &SequenceName) -> Option<u64> {
        self.counters.lock().await.get(name).copied()
    }
}

impl SequenceStore for InMemorySequenceStore {
    fn next_value(
        &self,
        name: SequenceName,
    ) -> Pin<Box<dyn Future<Output = Result<u64, SequenceStoreError>> + Send + '_>> {
        Box::pin(async move {
            let mut counters = self.counters.lock().await;
            let next = if let Some(value) = counters.get(&name) {
                value + 1
            } else {
                // Lock held across seeding: first-use is serialized, like the
                // production store's creation path.
                self.seeder.initial_value(name.clone()).await? + 1
            };
            counters.insert(name, next);
            self.allocations.fetch_add(1, Ordering::SeqCst);
            Ok(next)
        })
    }
}

/// In-memory record store enforcing both uniqueness invariants.
///
/// Mirrors the production store's failure signal: an insert that collides on
/// the entry code reports [`RecordStoreError::EntryCodeConflict`], a
/// non-empty license collision reports
/// [`RecordStoreError::LicenseConflict`]. Blank licenses never collide.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    rows: Arc<RwLock<Vec<RegistrationRecord>>>,
    next_id: Arc<AtomicI64>,
}

impl InMemoryRecordStore {
    /// Create a new empty record store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }

    /// Number of persisted records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.read().unwrap().len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.read().unwrap().is_empty()
    }

    /// Clear all records (for test isolation).
    pub fn clear(&self) {
        self.rows.write().unwrap().clear();
    }

    /// Snapshot of all persisted records.
    #[must_use]
    pub fn records(&self) -> Vec<RegistrationRecord> {
        self.rows.read().unwrap().clone()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn insert(
        &self,
        registration: NewRegistration,
        entry_code: EntryCode,
        form_file: String,
        created_at: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<RegistrationRecord, RecordStoreError>> + Send + '_>>
    {
        Box::pin(async move {
            let mut rows = self.rows.write().unwrap();

            if rows.iter().any(|r| r.entry_code == entry_code) {
                return Err(RecordStoreError::EntryCodeConflict { code: entry_code });
            }
            if !registration.license_no.is_empty()
                && rows
                    .iter()
                    .any(|r| r.registration.license_no == registration.license_no)
            {
                return Err(RecordStoreError::LicenseConflict {
                    license: registration.license_no.clone(),
                });
            }

            let record = RegistrationRecord {
                id: self.next_id.fetch_add(1, Ordering::SeqCst),
                entry_code,
                registration,
                form_file,
                created_at,
            };
            rows.push(record.clone());
            Ok(record)
        })
    }

    fn find_by_license(
        &self,
        license: String,
    ) -> Pin<
        Box<dyn Future<Output = Result<Option<RegistrationRecord>, RecordStoreError>> + Send + '_>,
    > {
        Box::pin(async move {
            let rows = self.rows.read().unwrap();
            Ok(rows
                .iter()
                .find(|r| !license.is_empty() && r.registration.license_no == license)
                .cloned())
        })
    }

    fn find_by_entry_code(
        &self,
        code: EntryCode,
    ) -> Pin<
        Box<dyn Future<Output = Result<Option<RegistrationRecord>, RecordStoreError>> + Send + '_>,
    > {
        Box::pin(async move {
            let rows = self.rows.read().unwrap();
            Ok(rows.iter().find(|r| r.entry_code == code).cloned())
        })
    }
}

/// Record store that reports an entry-code conflict on every insert.
///
/// Drives the retry loop to exhaustion in tests; lookups behave as an empty
/// store so pre-checks pass.
#[derive(Clone, Default)]
pub struct CollidingRecordStore {
    attempts: Arc<AtomicUsize>,
}

impl CollidingRecordStore {
    /// Create a new always-colliding store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of insert attempts received.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl RecordStore for CollidingRecordStore {
    fn insert(
        &self,
        _registration: NewRegistration,
        entry_code: EntryCode,
        _form_file: String,
        _created_at: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<RegistrationRecord, RecordStoreError>> + Send + '_>>
    {
        Box::pin(async move {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(RecordStoreError::EntryCodeConflict { code: entry_code })
        })
    }

    fn find_by_license(
        &self,
        _license: String,
    ) -> Pin<
        Box<dyn Future<Output = Result<Option<RegistrationRecord>, RecordStoreError>> + Send + '_>,
    > {
        Box::pin(async { Ok(None) })
    }

    fn find_by_entry_code(
        &self,
        _code: EntryCode,
    ) -> Pin<
        Box<dyn Future<Output = Result<Option<RegistrationRecord>, RecordStoreError>> + Send + '_>,
    > {
        Box::pin(async { Ok(None) })
    }
}

/// Renderer stub with a queue of scripted outcomes.
///
/// Each `render` call pops the next outcome; once the script is exhausted,
/// calls succeed with a fabricated file descriptor. The call counter lets
/// tests assert that the pipeline did not silently retry rendering.
pub struct ScriptedRenderer {
    outcomes: StdMutex<VecDeque<RenderResult<RenderedForm>>>,
    calls: AtomicUsize,
}

impl ScriptedRenderer {
    /// Create a renderer that plays back `outcomes` in order.
    #[must_use]
    pub fn new(outcomes: Vec<RenderResult<RenderedForm>>) -> Self {
        Self {
            outcomes: StdMutex::new(outcomes.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of render calls received.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn default_form(code: &EntryCode) -> RenderedForm {
        RenderedForm {
            file_name: format!("form_{code}.png"),
            file_path: format!("forms/form_{code}.png"),
        }
    }
}

impl FormRenderer for ScriptedRenderer {
    fn render(
        &self,
        entry_code: EntryCode,
        _registration: NewRegistration,
    ) -> Pin<Box<dyn Future<Output = RenderResult<RenderedForm>> + Send + '_>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Self::default_form(&entry_code)))
        })
    }
}

/// Renderer that always fails with the given message.
pub struct FailingRenderer {
    message: String,
    calls: AtomicUsize,
}

impl FailingRenderer {
    /// Create a renderer that fails every call with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of render calls received.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FormRenderer for FailingRenderer {
    fn render(
        &self,
        _entry_code: EntryCode,
        _registration: NewRegistration,
    ) -> Pin<Box<dyn Future<Output = RenderResult<RenderedForm>> + Send + '_>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(RenderError::Failed {
                message: self.message.clone(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use startline_core::entry::Category;
    use startline_core::sequence::ZeroSeeder;

    fn sample_registration(license: &str) -> NewRegistration {
        NewRegistration {
            first_name: "Anna".to_string(),
            last_name: "Kovacs".to_string(),
            birth_date: NaiveDate::from_ymd_opt(2010, 3, 14).unwrap(),
            club: "Falcons".to_string(),
            category: Category::Cadet,
            age: 15,
            weight_kg: 52.0,
            license_no: license.to_string(),
        }
    }

    #[tokio::test]
    async fn sequence_store_counts_up_per_namespace() {
        let store = InMemorySequenceStore::new(Arc::new(ZeroSeeder));
        let cadets = SequenceName::new("cadet_entries");
        let seniors = SequenceName::new("senior_entries");

        assert_eq!(store.next_value(cadets.clone()).await, Ok(1));
        assert_eq!(store.next_value(cadets.clone()).await, Ok(2));
        assert_eq!(store.next_value(seniors).await, Ok(1));
        assert_eq!(store.allocations(), 3);
        assert_eq!(store.current_value(&cadets).await, Some(2));
    }

    #[tokio::test]
    async fn record_store_tags_the_violated_constraint() {
        let store = InMemoryRecordStore::new();
        let now = Utc::now();

        store
            .insert(
                sample_registration("HUN-0001"),
                EntryCode::format("CAD", 1),
                "form_CAD-000001.png".to_string(),
                now,
            )
            .await
            .unwrap();

        let code_collision = store
            .insert(
                sample_registration("HUN-0002"),
                EntryCode::format("CAD", 1),
                "form.png".to_string(),
                now,
            )
            .await;
        assert!(matches!(
            code_collision,
            Err(RecordStoreError::EntryCodeConflict { .. })
        ));

        let license_collision = store
            .insert(
                sample_registration("HUN-0001"),
                EntryCode::format("CAD", 2),
                "form.png".to_string(),
                now,
            )
            .await;
        assert!(matches!(
            license_collision,
            Err(RecordStoreError::LicenseConflict { .. })
        ));
    }

    #[tokio::test]
    async fn blank_licenses_do_not_collide() {
        let store = InMemoryRecordStore::new();
        let now = Utc::now();

        for value in 1..=2 {
            let inserted = store
                .insert(
                    sample_registration(""),
                    EntryCode::format("CAD", value),
                    format!("form_{value}.png"),
                    now,
                )
                .await;
            assert!(inserted.is_ok());
        }
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn scripted_renderer_plays_back_then_defaults() {
        let renderer = ScriptedRenderer::new(vec![Err(RenderError::Timeout)]);
        let code = EntryCode::format("CAD", 1);

        let first = renderer
            .render(code.clone(), sample_registration(""))
            .await;
        assert_eq!(first, Err(RenderError::Timeout));

        let second = renderer.render(code, sample_registration("")).await;
        assert!(second.is_ok());
        assert_eq!(renderer.calls(), 2);
    }
}
