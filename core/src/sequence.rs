//! Sequence store trait and related types for entry-code allocation.
//!
//! This module defines the core abstraction for a persisted counter store -
//! a mapping from namespace name to integer supporting exactly one mutating
//! operation: atomic increment-and-return.
//!
//! # Design
//!
//! The `SequenceStore` trait is deliberately minimal. It provides exactly
//! what identifier allocation needs:
//!
//! - Atomically increment a named counter and return the new value
//! - Lazily materialize the counter row on first use, seeded by an injected
//!   [`SequenceSeeder`]
//!
//! It deliberately does NOT provide:
//! - A peek operation (any read-then-write use would defeat atomicity)
//! - A decrement operation (abandoned values stay abandoned; gaps in the
//!   numbering are acceptable, a compensating decrement would race)
//!
//! # Implementations
//!
//! - `PostgresSequenceStore` (in `startline-postgres`): Production
//!   implementation using a single-round-trip atomic update
//! - `InMemorySequenceStore` (in `startline-testing`): Fast, deterministic
//!   testing
//!
//! # Example
//!
//! ```no_run
//! use startline_core::entry::{EntryCode, SequenceName};
//! use startline_core::sequence::{SequenceStore, SequenceStoreError};
//!
//! async fn allocate<S: SequenceStore>(store: &S) -> Result<EntryCode, SequenceStoreError> {
//!     let value = store.next_value(SequenceName::new("cadet_entries")).await?;
//!     Ok(EntryCode::format("CAD", value))
//! }
//! ```

use crate::entry::SequenceName;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur during sequence store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequenceStoreError {
    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(String),

    /// The injected seed computation failed.
    #[error("Seed computation failed for {name}: {message}")]
    Seed {
        /// The namespace whose seed could not be computed.
        name: SequenceName,
        /// What went wrong.
        message: String,
    },
}

/// Persisted counter store with one atomic operation.
///
/// Two concurrent `next_value` calls for the same name must never return the
/// same value, across tasks and across processes sharing the backing store.
/// Values are monotonically increasing and never reused once issued, even if
/// no record ends up owning them.
///
/// # Lazy initialization
///
/// If no counter row exists for a name, the implementation must materialize
/// one without losing atomicity: attempt the atomic increment first; if no
/// row was found, compute a seed via the injected [`SequenceSeeder`] and
/// attempt to create the row with `seed + 1`. If the creation loses a race
/// against another process, fall back to the increment path, which the
/// winner's row now satisfies.
///
/// # Dyn Compatibility
///
/// This trait uses explicit `Pin<Box<dyn Future>>` returns instead of
/// `async fn` to enable trait object usage (`Arc<dyn SequenceStore>`), which
/// the submission orchestrator relies on for dependency injection.
pub trait SequenceStore: Send + Sync {
    /// Atomically increment the named counter and return the new value.
    ///
    /// # Errors
    ///
    /// - `Database`: the backing store could not be reached or the statement
    ///   failed
    /// - `Seed`: the counter row did not exist and the seed computation
    ///   failed
    fn next_value(
        &self,
        name: SequenceName,
    ) -> Pin<Box<dyn Future<Output = Result<u64, SequenceStoreError>> + Send + '_>>;
}

/// Computes the initial value for a counter namespace that has no row yet.
///
/// Consulted at most once per namespace lifetime, when the first allocation
/// finds no counter row. Implementations may scan existing records for the
/// highest previously-issued value (best effort; see `LatestRecordSeeder` in
/// `startline-postgres`) or simply return a constant ([`ZeroSeeder`]).
///
/// The seed carries no atomicity guarantee of its own: two processes racing
/// through first-use may compute equal seeds. Exactly one of them wins row
/// creation, and the record store's uniqueness constraint backstops any
/// duplicate code that could still slip through.
pub trait SequenceSeeder: Send + Sync {
    /// Compute the seed for `name`. The first issued value will be
    /// `seed + 1`.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceStoreError`] if the seed source cannot be read.
    fn initial_value(
        &self,
        name: SequenceName,
    ) -> Pin<Box<dyn Future<Output = Result<u64, SequenceStoreError>> + Send + '_>>;
}

/// Seeder that always starts namespaces at zero (first code is `…-000001`).
///
/// The right choice for fresh installs and for tests that don't model
/// pre-existing records.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZeroSeeder;

impl ZeroSeeder {
    /// Create a new `ZeroSeeder`.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SequenceSeeder for ZeroSeeder {
    fn initial_value(
        &self,
        _name: SequenceName,
    ) -> Pin<Box<dyn Future<Output = Result<u64, SequenceStoreError>> + Send + '_>> {
        Box::pin(async { Ok(0) })
    }
}
