//! `PostgreSQL` record store.
//!
//! Persists registration records and enforces both uniqueness invariants at
//! the storage layer: a unique constraint on `entry_code` and a partial
//! unique index on non-empty `license_no` values. The insert's failure
//! signal names the violated constraint, which is what the submission
//! pipeline's retry policy branches on.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use startline_core::entry::{Category, EntryCode};
use startline_core::record::{
    NewRegistration, RecordStore, RecordStoreError, RegistrationRecord,
};
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

/// Constraint backing entry-code uniqueness.
const ENTRY_CODE_CONSTRAINT: &str = "registrations_entry_code_key";
/// Partial unique index backing non-empty license uniqueness.
const LICENSE_CONSTRAINT: &str = "registrations_license_no_key";

/// `PostgreSQL`-backed registration record store.
#[derive(Clone)]
pub struct PostgresRecordStore {
    /// `PostgreSQL` connection pool.
    pool: PgPool,
}

impl PostgresRecordStore {
    /// Create a new record store with the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run database migrations for both the registrations and sequences
    /// tables.
    ///
    /// # Errors
    ///
    /// Returns [`RecordStoreError::Database`] if migrations fail.
    pub async fn migrate(&self) -> Result<(), RecordStoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RecordStoreError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Map an insert failure to the violated constraint.
    fn map_insert_error(
        error: &sqlx::Error,
        entry_code: &EntryCode,
        license: &str,
    ) -> RecordStoreError {
        if let sqlx::Error::Database(db_error) = error {
            if db_error.is_unique_violation() {
                match db_error.constraint() {
                    Some(ENTRY_CODE_CONSTRAINT) => {
                        return RecordStoreError::EntryCodeConflict {
                            code: entry_code.clone(),
                        };
                    }
                    Some(LICENSE_CONSTRAINT) => {
                        return RecordStoreError::LicenseConflict {
                            license: license.to_string(),
                        };
                    }
                    _ => {}
                }
            }
        }
        RecordStoreError::Database(error.to_string())
    }

    /// Convert a database row to a `RegistrationRecord`.
    fn row_to_record(row: &sqlx::postgres::PgRow) -> Result<RegistrationRecord, RecordStoreError> {
        let category_str: String = row.get("category");
        let category = Category::from_str(&category_str)
            .map_err(|e| RecordStoreError::Database(e.to_string()))?;

        let entry_code_str: String = row.get("entry_code");
        let entry_code = EntryCode::from_str(&entry_code_str)
            .map_err(|e| RecordStoreError::Database(e.to_string()))?;

        let age: i32 = row.get("age");
        #[allow(clippy::cast_sign_loss)] // age is validated non-negative before insert
        let age = age as u32;

        Ok(RegistrationRecord {
            id: row.get("id"),
            entry_code,
            registration: NewRegistration {
                first_name: row.get("first_name"),
                last_name: row.get("last_name"),
                birth_date: row.get("birth_date"),
                club: row.get("club"),
                category,
                age,
                weight_kg: row.get("weight_kg"),
                license_no: row.get("license_no"),
            },
            form_file: row.get("form_file"),
            created_at: row.get("created_at"),
        })
    }
}

impl RecordStore for PostgresRecordStore {
    fn insert(
        &self,
        registration: NewRegistration,
        entry_code: EntryCode,
        form_file: String,
        created_at: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<RegistrationRecord, RecordStoreError>> + Send + '_>>
    {
        Box::pin(async move {
            #[allow(clippy::cast_possible_wrap)] // ages fit comfortably in i32
            let id: (i64,) = sqlx::query_as(
                r"
                INSERT INTO registrations (
                    entry_code, first_name, last_name, birth_date, club,
                    category, age, weight_kg, license_no, form_file, created_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                RETURNING id
                ",
            )
            .bind(entry_code.as_str())
            .bind(&registration.first_name)
            .bind(&registration.last_name)
            .bind(registration.birth_date)
            .bind(&registration.club)
            .bind(registration.category.as_str())
            .bind(registration.age as i32)
            .bind(registration.weight_kg)
            .bind(&registration.license_no)
            .bind(&form_file)
            .bind(created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                Self::map_insert_error(&e, &entry_code, &registration.license_no)
            })?;

            tracing::info!(
                record_id = id.0,
                entry_code = entry_code.as_str(),
                category = registration.category.as_str(),
                "Registration record persisted"
            );
            metrics::counter!(
                "record_store.inserted",
                "category" => registration.category.as_str()
            )
            .increment(1);

            Ok(RegistrationRecord {
                id: id.0,
                entry_code,
                registration,
                form_file,
                created_at,
            })
        })
    }

    fn find_by_license(
        &self,
        license: String,
    ) -> Pin<
        Box<dyn Future<Output = Result<Option<RegistrationRecord>, RecordStoreError>> + Send + '_>,
    > {
        Box::pin(async move {
            let row = sqlx::query(
                r"
                SELECT id, entry_code, first_name, last_name, birth_date, club,
                       category, age, weight_kg, license_no, form_file, created_at
                FROM registrations
                WHERE license_no = $1 AND license_no <> ''
                ",
            )
            .bind(&license)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RecordStoreError::Database(e.to_string()))?;

            row.as_ref().map(Self::row_to_record).transpose()
        })
    }

    fn find_by_entry_code(
        &self,
        code: EntryCode,
    ) -> Pin<
        Box<dyn Future<Output = Result<Option<RegistrationRecord>, RecordStoreError>> + Send + '_>,
    > {
        Box::pin(async move {
            let row = sqlx::query(
                r"
                SELECT id, entry_code, first_name, last_name, birth_date, club,
                       category, age, weight_kg, license_no, form_file, created_at
                FROM registrations
                WHERE entry_code = $1
                ",
            )
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RecordStoreError::Database(e.to_string()))?;

            row.as_ref().map(Self::row_to_record).transpose()
        })
    }
}
