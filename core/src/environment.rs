//! Injected dependencies abstracted behind traits.
//!
//! External concerns the pipeline needs but should not own are injected via
//! small traits, so every collaborator can be replaced with a deterministic
//! double in tests.

use chrono::{DateTime, Utc};

/// Clock trait - abstracts time operations for testability.
///
/// Record timestamps come from an injected clock rather than `Utc::now()`
/// call sites, so tests can pin time.
pub trait Clock: Send + Sync {
    /// Get the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
