//! Form renderer trait.
//!
//! Abstraction over the application-form rendering subsystem. Rendering is
//! consumed as a black box: given a normalized registration and its entry
//! code it produces a generated-file descriptor or fails. It may be slow
//! (the orchestrator wraps calls in a timeout) and its pixel-level layout
//! logic lives elsewhere entirely.

use crate::entry::EntryCode;
use crate::record::NewRegistration;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Renderer result.
pub type RenderResult<T> = Result<T, RenderError>;

/// Form renderer error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The renderer reported a failure.
    #[error("Form rendering failed: {message}")]
    Failed {
        /// Renderer-supplied failure message.
        message: String,
    },

    /// The render call exceeded its deadline.
    ///
    /// Treated identically to [`RenderError::Failed`] by the orchestrator.
    #[error("Form rendering timed out")]
    Timeout,
}

/// Descriptor of a successfully rendered application form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedForm {
    /// Generated file name, stored on the registration record.
    pub file_name: String,
    /// Full path to the generated file.
    pub file_path: String,
}

/// Application-form rendering collaborator.
///
/// # Contract
///
/// One call per allocation attempt, with the entry code baked into the
/// rendered output. A failure aborts the whole submission: render failures
/// are never retried by the pipeline (only entry-code collisions are), and
/// because rendering happens before persistence, a failure never leaves an
/// orphaned record behind.
///
/// # Dyn Compatibility
///
/// Explicit `Pin<Box<dyn Future>>` returns keep the trait object-safe for
/// `Arc<dyn FormRenderer>` injection.
pub trait FormRenderer: Send + Sync {
    /// Render the application form for one registration.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if the renderer fails; the orchestrator
    /// treats a reported failure and a timeout identically.
    fn render(
        &self,
        entry_code: EntryCode,
        registration: NewRegistration,
    ) -> Pin<Box<dyn Future<Output = RenderResult<RenderedForm>> + Send + '_>>;
}
