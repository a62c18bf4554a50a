//! `PostgreSQL` sequence store.
//!
//! Implements atomic increment-and-return over a `sequences` table. The
//! increment is a single `UPDATE … RETURNING` round trip; correctness under
//! concurrency rests on row-level locking inside that one statement, never
//! on a read-then-write pair in application code.

use sqlx::PgPool;
use startline_core::entry::SequenceName;
use startline_core::sequence::{SequenceSeeder, SequenceStore, SequenceStoreError};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// `PostgreSQL`-backed counter store.
///
/// # Lazy creation
///
/// A namespace with no row yet is materialized on first allocation: the
/// injected [`SequenceSeeder`] computes a starting point and the row is
/// created with `INSERT … ON CONFLICT (name) DO NOTHING`. When two processes
/// race through first-use, exactly one insert wins; the loser loops back to
/// the increment path, which the winner's row now satisfies. Both callers
/// still receive distinct values.
///
/// The store never decrements and exposes no peek: a value handed out stays
/// consumed even if the submission that requested it is later abandoned.
pub struct PostgresSequenceStore {
    pool: PgPool,
    seeder: Arc<dyn SequenceSeeder>,
}

impl PostgresSequenceStore {
    /// Create a new sequence store with the given pool and seeder.
    #[must_use]
    pub fn new(pool: PgPool, seeder: Arc<dyn SequenceSeeder>) -> Self {
        Self { pool, seeder }
    }

    async fn try_increment(&self, name: &SequenceName) -> Result<Option<u64>, SequenceStoreError> {
        let row: Option<(i64,)> = sqlx::query_as(
            r"
            UPDATE sequences
            SET value = value + 1
            WHERE name = $1
            RETURNING value
            ",
        )
        .bind(name.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SequenceStoreError::Database(e.to_string()))?;

        #[allow(clippy::cast_sign_loss)] // value is constrained non-negative by the schema
        let value = row.map(|(value,)| value as u64);
        Ok(value)
    }

    async fn try_create(&self, name: &SequenceName, first: u64) -> Result<bool, SequenceStoreError> {
        #[allow(clippy::cast_possible_wrap)] // counter values stay far below i64::MAX
        let result = sqlx::query(
            r"
            INSERT INTO sequences (name, value)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            ",
        )
        .bind(name.as_str())
        .bind(first as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| SequenceStoreError::Database(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }
}

impl SequenceStore for PostgresSequenceStore {
    fn next_value(
        &self,
        name: SequenceName,
    ) -> Pin<Box<dyn Future<Output = Result<u64, SequenceStoreError>> + Send + '_>> {
        Box::pin(async move {
            loop {
                if let Some(value) = self.try_increment(&name).await? {
                    metrics::counter!("sequence_store.allocated", "sequence" => name.as_str().to_string())
                        .increment(1);
                    return Ok(value);
                }

                // No row yet: seed and try to create it. The seed is consulted
                // at most once per namespace lifetime.
                let seed = self.seeder.initial_value(name.clone()).await?;
                let first = seed + 1;
                if self.try_create(&name, first).await? {
                    tracing::info!(
                        sequence = name.as_str(),
                        seed,
                        first,
                        "Sequence namespace materialized on first allocation"
                    );
                    metrics::counter!("sequence_store.seeded").increment(1);
                    return Ok(first);
                }

                // Lost the creation race; the winner's row satisfies the
                // increment path on the next pass.
                tracing::debug!(
                    sequence = name.as_str(),
                    "Sequence creation raced, retrying increment"
                );
            }
        })
    }
}
