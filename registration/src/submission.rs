//! Registration submission orchestrator.
//!
//! Coordinates one submission through the pipeline: validate and normalize,
//! pre-check the license invariant, then run a bounded retry loop that
//! allocates an entry code, renders the application form, and persists the
//! record.
//!
//! # Retry policy
//!
//! Exactly one failure class is retried: an entry-code uniqueness violation
//! on insert. The collided attempt is discarded wholesale and the loop
//! allocates a fresh code, up to [`MAX_ATTEMPTS`]. Everything else -
//! validation, rendering (including timeout), any other store failure -
//! terminates the submission immediately. Rendering is never retried by the
//! pipeline.
//!
//! # Side-effect ordering
//!
//! Per attempt: counter, then render, then insert. The counter moves first
//! even on attempts that are later discarded; the abandoned value stays a
//! gap in the numbering, because a compensating decrement would race with
//! concurrent allocations. Rendering happens before persistence so a
//! committed record always references a successfully generated form, and a
//! render failure never leaves an orphaned row behind.

use crate::types::{ErrorResponse, SubmissionReceipt, SubmissionRequest};
use crate::validate::{self, ValidationError};
use startline_core::entry::EntryCode;
use startline_core::environment::Clock;
use startline_core::record::{NewRegistration, RecordStore, RecordStoreError};
use startline_core::renderer::{FormRenderer, RenderError, RenderedForm};
use startline_core::sequence::{SequenceStore, SequenceStoreError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Maximum entry-code allocation attempts per submission.
pub const MAX_ATTEMPTS: u32 = 3;

/// Default deadline for a single render call.
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can terminate a submission.
///
/// Each variant maps to a stable [`kind`](SubmissionError::kind) string so
/// callers can distinguish bad input from overload from infrastructure
/// failure without parsing messages.
#[derive(Error, Debug)]
pub enum SubmissionError {
    /// The submission was malformed; nothing was consumed.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The license number is already registered; nothing was consumed
    /// (pre-check), or the insert raced into the same constraint.
    #[error("License number already registered: {license}")]
    DuplicateLicense {
        /// The duplicate license number.
        license: String,
    },

    /// The form renderer failed or timed out; the allocated entry number
    /// is abandoned as a gap.
    #[error("Form rendering failed: {0}")]
    Rendering(#[from] RenderError),

    /// Every attempt collided on the entry code. Rare and likely systemic
    /// (massively concurrent load); retryable by the client.
    #[error("Entry code allocation exhausted after {attempts} attempts")]
    CollisionExhausted {
        /// How many allocation attempts were made.
        attempts: u32,
    },

    /// The sequence store failed.
    #[error("Sequence store error: {0}")]
    Sequence(#[from] SequenceStoreError),

    /// The record store failed for a reason other than a uniqueness
    /// conflict.
    #[error("Record store error: {0}")]
    Record(RecordStoreError),
}

impl SubmissionError {
    /// Stable machine-readable error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::DuplicateLicense { .. } => "validation_error",
            Self::Rendering(_) => "rendering_error",
            Self::CollisionExhausted { .. } => "identifier_collision_exhausted",
            Self::Sequence(_) | Self::Record(_) => "store_error",
        }
    }
}

impl From<&SubmissionError> for ErrorResponse {
    fn from(error: &SubmissionError) -> Self {
        Self {
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

/// The submission orchestrator.
///
/// Runs once per inbound submission; many instances of this call proceed
/// concurrently over the same backing stores. There is no in-process mutual
/// exclusion and none is required - correctness is delegated entirely to
/// the sequence store's atomic increment and the record store's uniqueness
/// constraints.
pub struct SubmissionService {
    sequences: Arc<dyn SequenceStore>,
    records: Arc<dyn RecordStore>,
    renderer: Arc<dyn FormRenderer>,
    clock: Arc<dyn Clock>,
    render_timeout: Duration,
}

impl SubmissionService {
    /// Create a new submission service with the default render timeout.
    #[must_use]
    pub fn new(
        sequences: Arc<dyn SequenceStore>,
        records: Arc<dyn RecordStore>,
        renderer: Arc<dyn FormRenderer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sequences,
            records,
            renderer,
            clock,
            render_timeout: DEFAULT_RENDER_TIMEOUT,
        }
    }

    /// Override the per-call render deadline.
    #[must_use]
    pub const fn with_render_timeout(mut self, timeout: Duration) -> Self {
        self.render_timeout = timeout;
        self
    }

    /// Process one submission end to end.
    ///
    /// # Errors
    ///
    /// See [`SubmissionError`] for the taxonomy; only entry-code collisions
    /// are retried internally, everything else surfaces on first
    /// occurrence.
    pub async fn submit(
        &self,
        request: SubmissionRequest,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let registration = validate::normalize(&request)?;

        // License pre-check runs before any counter consumption. The store
        // constraint still backstops submissions racing past this check.
        if !registration.license_no.is_empty() {
            let existing = self
                .records
                .find_by_license(registration.license_no.clone())
                .await
                .map_err(SubmissionError::Record)?;
            if existing.is_some() {
                tracing::info!(
                    license = registration.license_no.as_str(),
                    "Submission rejected: duplicate license"
                );
                metrics::counter!("registration.rejected", "reason" => "duplicate_license")
                    .increment(1);
                return Err(SubmissionError::DuplicateLicense {
                    license: registration.license_no,
                });
            }
        }

        let category = registration.category;
        let mut attempt = 0;
        let mut last_collision: Option<EntryCode> = None;

        while attempt < MAX_ATTEMPTS {
            attempt += 1;

            let value = self
                .sequences
                .next_value(category.sequence_name())
                .await?;
            let entry_code = EntryCode::format(category.code_prefix(), value);

            // Render before persist: a committed record always has a form,
            // and a render failure never orphans a row. A failure here also
            // abandons the freshly allocated value as a gap.
            let rendered = self
                .render_with_timeout(entry_code.clone(), &registration)
                .await?;

            match self
                .records
                .insert(
                    registration.clone(),
                    entry_code.clone(),
                    rendered.file_name.clone(),
                    self.clock.now(),
                )
                .await
            {
                Ok(record) => {
                    tracing::info!(
                        entry_code = record.entry_code.as_str(),
                        category = category.as_str(),
                        attempt,
                        "Submission committed"
                    );
                    metrics::counter!("registration.committed", "category" => category.as_str())
                        .increment(1);
                    return Ok(SubmissionReceipt {
                        entry_code: record.entry_code.clone(),
                        form_file: rendered.file_name,
                        form_path: rendered.file_path,
                        record,
                    });
                }
                Err(RecordStoreError::EntryCodeConflict { code }) => {
                    tracing::warn!(
                        entry_code = code.as_str(),
                        attempt,
                        "Entry code collided, discarding attempt"
                    );
                    metrics::counter!("registration.entry_code_collision").increment(1);
                    last_collision = Some(code);
                    // The collided value stays consumed; loop allocates afresh.
                }
                Err(RecordStoreError::LicenseConflict { license }) => {
                    // Raced past the pre-check; terminal, same as a pre-check hit.
                    return Err(SubmissionError::DuplicateLicense { license });
                }
                Err(other) => return Err(SubmissionError::Record(other)),
            }
        }

        tracing::error!(
            attempts = MAX_ATTEMPTS,
            last_collision = last_collision.as_ref().map(EntryCode::as_str),
            category = category.as_str(),
            "Entry code allocation exhausted"
        );
        metrics::counter!("registration.collision_exhausted").increment(1);
        Err(SubmissionError::CollisionExhausted {
            attempts: MAX_ATTEMPTS,
        })
    }

    async fn render_with_timeout(
        &self,
        entry_code: EntryCode,
        registration: &NewRegistration,
    ) -> Result<RenderedForm, SubmissionError> {
        let render = self.renderer.render(entry_code.clone(), registration.clone());
        match tokio::time::timeout(self.render_timeout, render).await {
            Ok(Ok(form)) => Ok(form),
            Ok(Err(error)) => {
                tracing::warn!(
                    entry_code = entry_code.as_str(),
                    error = %error,
                    "Form rendering failed, aborting submission"
                );
                metrics::counter!("registration.render_failed").increment(1);
                Err(SubmissionError::Rendering(error))
            }
            Err(_elapsed) => {
                tracing::warn!(
                    entry_code = entry_code.as_str(),
                    timeout_ms = self.render_timeout.as_millis(),
                    "Form rendering timed out, aborting submission"
                );
                metrics::counter!("registration.render_timeout").increment(1);
                Err(SubmissionError::Rendering(RenderError::Timeout))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use startline_core::renderer::RenderError;
    use startline_core::sequence::ZeroSeeder;
    use startline_testing::{
        CollidingRecordStore, InMemoryRecordStore, InMemorySequenceStore, ScriptedRenderer,
        test_clock,
    };

    fn request() -> SubmissionRequest {
        SubmissionRequest {
            first_name: "Anna".to_string(),
            last_name: "Kovacs".to_string(),
            birth_date: "2010-03-14".to_string(),
            club: Some("Falcons".to_string()),
            category: "cadet".to_string(),
            age: "15".to_string(),
            weight_kg: "52.5".to_string(),
            license_no: None,
        }
    }

    fn service_with(
        sequences: InMemorySequenceStore,
        records: Arc<dyn RecordStore>,
        renderer: Arc<dyn FormRenderer>,
    ) -> SubmissionService {
        SubmissionService::new(
            Arc::new(sequences),
            records,
            renderer,
            Arc::new(test_clock()),
        )
    }

    #[tokio::test]
    async fn commits_with_a_formatted_code() {
        let sequences = InMemorySequenceStore::new(Arc::new(ZeroSeeder));
        let service = service_with(
            sequences,
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(ScriptedRenderer::new(vec![])),
        );

        let receipt = service.submit(request()).await.unwrap();
        assert_eq!(receipt.entry_code.as_str(), "CAD-000001");
        assert_eq!(receipt.form_file, "form_CAD-000001.png");
    }

    struct SlowRenderer;

    impl FormRenderer for SlowRenderer {
        fn render(
            &self,
            entry_code: EntryCode,
            _registration: NewRegistration,
        ) -> std::pin::Pin<
            Box<
                dyn std::future::Future<Output = startline_core::renderer::RenderResult<RenderedForm>>
                    + Send
                    + '_,
            >,
        > {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(RenderedForm {
                    file_name: format!("form_{entry_code}.png"),
                    file_path: format!("forms/form_{entry_code}.png"),
                })
            })
        }
    }

    #[tokio::test]
    async fn render_timeout_is_a_rendering_error() {
        let sequences = InMemorySequenceStore::new(Arc::new(ZeroSeeder));
        let service = service_with(
            sequences,
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(SlowRenderer),
        )
        .with_render_timeout(Duration::from_millis(10));

        let error = service.submit(request()).await.unwrap_err();
        assert!(matches!(
            error,
            SubmissionError::Rendering(RenderError::Timeout)
        ));
        assert_eq!(error.kind(), "rendering_error");
    }

    #[tokio::test]
    async fn exhaustion_reports_its_kind() {
        let sequences = InMemorySequenceStore::new(Arc::new(ZeroSeeder));
        let service = service_with(
            sequences,
            Arc::new(CollidingRecordStore::new()),
            Arc::new(ScriptedRenderer::new(vec![])),
        );

        let error = service.submit(request()).await.unwrap_err();
        assert!(matches!(
            error,
            SubmissionError::CollisionExhausted { attempts: MAX_ATTEMPTS }
        ));
        assert_eq!(error.kind(), "identifier_collision_exhausted");
    }
}
