//! Seed heuristic recovering the highest previously-issued entry number.
//!
//! Used when a counter namespace has no row yet but registrations already
//! exist (e.g. after importing historical data): the newest record's entry
//! code is parsed for its numeric suffix and the counter picks up from
//! there instead of re-issuing low numbers.

use sqlx::PgPool;
use startline_core::entry::{Category, EntryCode, SequenceName};
use startline_core::sequence::{SequenceSeeder, SequenceStoreError};
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

/// Best-effort seeder scanning existing registrations.
///
/// Looks up the newest record of the namespace's category (by creation
/// time, then row id as a tiebreaker) and parses the numeric suffix out of
/// its entry code. No records, or an unparseable code, seeds at zero.
///
/// This heuristic carries no atomicity guarantee of its own: two processes
/// racing through a namespace's first allocation may both observe the same
/// newest record. That is accepted - row creation in the sequence store has
/// exactly one winner, and the record store's unique constraint backstops
/// the rest. The seed is consulted at most once per namespace lifetime.
pub struct LatestRecordSeeder {
    pool: PgPool,
}

impl LatestRecordSeeder {
    /// Create a new seeder reading from the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SequenceSeeder for LatestRecordSeeder {
    fn initial_value(
        &self,
        name: SequenceName,
    ) -> Pin<Box<dyn Future<Output = Result<u64, SequenceStoreError>> + Send + '_>> {
        Box::pin(async move {
            let Some(category) = Category::from_sequence_name(&name) else {
                tracing::warn!(
                    sequence = name.as_str(),
                    "No category maps to this namespace, seeding at zero"
                );
                return Ok(0);
            };

            let row: Option<(String,)> = sqlx::query_as(
                r"
                SELECT entry_code
                FROM registrations
                WHERE category = $1
                ORDER BY created_at DESC, id DESC
                LIMIT 1
                ",
            )
            .bind(category.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| SequenceStoreError::Seed {
                name: name.clone(),
                message: e.to_string(),
            })?;

            let seed = row
                .and_then(|(code,)| EntryCode::from_str(&code).ok())
                .and_then(|code| code.numeric_suffix())
                .unwrap_or(0);

            tracing::info!(
                sequence = name.as_str(),
                category = category.as_str(),
                seed,
                "Computed sequence seed from newest registration"
            );
            Ok(seed)
        })
    }
}
