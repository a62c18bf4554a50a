//! # Startline Core
//!
//! Core traits and types for the Startline registration platform.
//!
//! This crate provides the abstractions for the identifier-allocation-and-
//! submission pipeline: sequential entry-code allocation, application-form
//! rendering, and exactly-once record persistence under concurrency.
//!
//! ## Core Concepts
//!
//! - **Entry code**: human-readable sequential identifier (`CAD-000042`)
//!   allocated from a named counter and globally unique across records
//! - **Sequence store**: persisted counters with one atomic operation,
//!   increment-and-return
//! - **Record store**: persisted registrations with storage-enforced
//!   uniqueness invariants, distinguishing *which* constraint an insert
//!   violated
//! - **Form renderer**: opaque collaborator producing the printed
//!   application form for a registration
//!
//! ## Architecture Principles
//!
//! - Correctness is delegated to store atomicity, never to in-process locks
//! - Collaborators are injected as trait objects, never reached as globals
//! - Retry decisions branch on tagged error variants, never on messages
//! - Abandoned counter values are accepted as gaps, never compensated
//!
//! ## Example
//!
//! ```no_run
//! use startline_core::entry::{Category, EntryCode};
//! use startline_core::sequence::{SequenceStore, SequenceStoreError};
//!
//! async fn allocate<S: SequenceStore>(store: &S) -> Result<EntryCode, SequenceStoreError> {
//!     let category = Category::Cadet;
//!     let value = store.next_value(category.sequence_name()).await?;
//!     Ok(EntryCode::format(category.code_prefix(), value))
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};

pub mod entry;
pub mod environment;
pub mod record;
pub mod renderer;
pub mod sequence;

pub use entry::{Category, EntryCode, SequenceName};
pub use environment::{Clock, SystemClock};
pub use record::{NewRegistration, RecordStore, RecordStoreError, RegistrationRecord};
pub use renderer::{FormRenderer, RenderError, RenderResult, RenderedForm};
pub use sequence::{SequenceSeeder, SequenceStore, SequenceStoreError, ZeroSeeder};
