//! # Startline Testing
//!
//! Testing utilities and deterministic doubles for the Startline
//! registration platform.
//!
//! This crate provides:
//! - In-memory implementations of the core store traits
//! - Scripted renderer stubs for failure-path testing
//! - A fixed clock for reproducible timestamps
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use startline_core::entry::SequenceName;
//! use startline_core::sequence::{SequenceStore, ZeroSeeder};
//! use startline_testing::InMemorySequenceStore;
//!
//! # async fn example() {
//! let store = InMemorySequenceStore::new(Arc::new(ZeroSeeder));
//! let first = store.next_value(SequenceName::new("cadet_entries")).await;
//! assert_eq!(first, Ok(1));
//! # }
//! ```

use chrono::{DateTime, Utc};
use startline_core::environment::Clock;

pub mod store_mocks;

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use startline_testing::mocks::FixedClock;
    /// use startline_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
pub use store_mocks::{
    CollidingRecordStore, FailingRenderer, InMemoryRecordStore, InMemorySequenceStore,
    ScriptedRenderer,
};
