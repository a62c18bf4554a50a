//! Registration record types and the record store trait.
//!
//! A registration record represents one persisted participant submission.
//! The store enforces two uniqueness invariants at the storage layer:
//!
//! - the entry code is globally unique
//! - the license number is unique among records where it is non-empty
//!   (blank licenses never collide with each other)
//!
//! Enforcing both in storage, not only in application code, is what lets
//! two orchestrator instances race past the application-level pre-check
//! without ever both succeeding. The store's failure signal distinguishes
//! *which* constraint was violated, because the submission retry policy
//! retries entry-code collisions only.

use crate::entry::{Category, EntryCode};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during record store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordStoreError {
    /// Insert failed because the entry code already exists.
    ///
    /// The only retryable insert failure: the orchestrator discards the
    /// attempt and allocates a fresh code.
    #[error("Entry code already taken: {code}")]
    EntryCodeConflict {
        /// The code that collided.
        code: EntryCode,
    },

    /// Insert failed because a non-empty license number already exists.
    ///
    /// Normally prevented by the pre-check; reaching this means two
    /// submissions raced past it. Terminal, never retried.
    #[error("License number already registered: {license}")]
    LicenseConflict {
        /// The license number that collided.
        license: String,
    },

    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(String),
}

/// A validated, normalized submission that has not been persisted yet.
///
/// This is also the payload handed to the form renderer: everything on the
/// printed application form comes from here plus the assigned entry code.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewRegistration {
    /// Participant first name, trimmed.
    pub first_name: String,
    /// Participant last name, trimmed.
    pub last_name: String,
    /// Date of birth.
    pub birth_date: NaiveDate,
    /// Club or team name, trimmed (may be empty).
    pub club: String,
    /// Registration category; decides the entry-code namespace.
    pub category: Category,
    /// Age in years at registration time.
    pub age: u32,
    /// Weight in kilograms.
    pub weight_kg: f64,
    /// Federation license card number; empty string when not provided.
    /// Non-empty values must be unique across all records.
    pub license_no: String,
}

/// One persisted participant registration.
///
/// Created exactly once per successful submission; never mutated by this
/// subsystem afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    /// Storage-assigned row identifier.
    pub id: i64,
    /// The globally unique entry code, immutable once assigned.
    pub entry_code: EntryCode,
    /// The normalized submission data.
    pub registration: NewRegistration,
    /// File name of the rendered application form.
    pub form_file: String,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// Persisted collection of registration records.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; many submissions insert
/// concurrently through a shared `Arc<dyn RecordStore>`.
///
/// # Implementations
///
/// - `PostgresRecordStore` (in `startline-postgres`): production storage
///   with both invariants enforced by database constraints
/// - `InMemoryRecordStore` (in `startline-testing`): deterministic tests
///
/// # Dyn Compatibility
///
/// Explicit `Pin<Box<dyn Future>>` returns keep the trait object-safe for
/// `Arc<dyn RecordStore>` injection into the orchestrator.
pub trait RecordStore: Send + Sync {
    /// Insert a new record, enforcing both uniqueness invariants.
    ///
    /// `form_file` is the renderer-produced asset name and `created_at` the
    /// submission timestamp; both are fixed at insert time.
    ///
    /// # Errors
    ///
    /// - `EntryCodeConflict`: the entry code is already persisted (retryable)
    /// - `LicenseConflict`: the non-empty license number is already
    ///   persisted (terminal)
    /// - `Database`: infrastructure failure (terminal)
    fn insert(
        &self,
        registration: NewRegistration,
        entry_code: EntryCode,
        form_file: String,
        created_at: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<RegistrationRecord, RecordStoreError>> + Send + '_>>;

    /// Look up a record by non-empty license number.
    ///
    /// Only ever called with non-blank input; blank licenses are not
    /// queryable because they don't participate in the uniqueness invariant.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::Database`] on infrastructure failure.
    fn find_by_license(
        &self,
        license: String,
    ) -> Pin<Box<dyn Future<Output = Result<Option<RegistrationRecord>, RecordStoreError>> + Send + '_>>;

    /// Look up a record by entry code.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::Database`] on infrastructure failure.
    fn find_by_entry_code(
        &self,
        code: EntryCode,
    ) -> Pin<Box<dyn Future<Output = Result<Option<RegistrationRecord>, RecordStoreError>> + Send + '_>>;
}
