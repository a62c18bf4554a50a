//! # Startline Registration
//!
//! The submission pipeline for the Startline registration platform: every
//! participant submission receives a unique sequential entry code, gets an
//! application form rendered, and is persisted exactly once, even under
//! concurrent submissions and partial failures.
//!
//! The pipeline per submission:
//!
//! 1. Validate and normalize ([`validate`])
//! 2. Pre-check the license uniqueness invariant
//! 3. Bounded retry loop: allocate code, render form, persist record,
//!    retrying only on entry-code collisions ([`submission`])
//!
//! Collaborators (sequence store, record store, renderer, clock) are
//! injected as trait objects from `startline-core`; production
//! implementations live in `startline-postgres`, deterministic doubles in
//! `startline-testing`.

pub mod config;
pub mod form_renderer;
pub mod submission;
pub mod types;
pub mod validate;

pub use config::Config;
pub use form_renderer::MockFormRenderer;
pub use submission::{MAX_ATTEMPTS, SubmissionError, SubmissionService};
pub use types::{ErrorResponse, SubmissionReceipt, SubmissionRequest};
pub use validate::ValidationError;
