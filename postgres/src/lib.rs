//! `PostgreSQL` store implementations for Startline.
//!
//! This crate provides the production implementations of the persistence
//! traits from `startline-core`. It uses sqlx and supports:
//!
//! - Atomic increment-and-return counters with race-safe lazy creation
//! - Record inserts whose failure signal names the violated constraint
//! - Connection pooling
//! - Schema migrations
//!
//! # Example
//!
//! ```ignore
//! use startline_postgres::{PostgresRecordStore, PostgresSequenceStore};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = sqlx::PgPool::connect("postgres://localhost/startline").await?;
//!     let records = PostgresRecordStore::new(pool.clone());
//!     records.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod record_store;
pub mod seeder;
pub mod sequence_store;

pub use record_store::PostgresRecordStore;
pub use seeder::LatestRecordSeeder;
pub use sequence_store::PostgresSequenceStore;
