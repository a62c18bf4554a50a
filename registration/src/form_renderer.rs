//! Mock form renderer for development and testing.
//!
//! This module provides a simplified renderer compatible with the real
//! application-form layout engine. In production this would be replaced
//! with the actual rendering integration; the pipeline only ever sees the
//! [`FormRenderer`] trait either way.

use startline_core::entry::EntryCode;
use startline_core::record::NewRegistration;
use startline_core::renderer::{FormRenderer, RenderResult, RenderedForm};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Mock form renderer (always succeeds for development)
///
/// Simulates render latency and fabricates file descriptors under a
/// configured output directory.
#[derive(Clone, Debug)]
pub struct MockFormRenderer {
    output_dir: String,
}

impl MockFormRenderer {
    /// Creates a new mock renderer writing under `output_dir`.
    #[must_use]
    pub fn new(output_dir: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared(output_dir: impl Into<String>) -> Arc<dyn FormRenderer> {
        Arc::new(Self::new(output_dir))
    }
}

impl Default for MockFormRenderer {
    fn default() -> Self {
        Self::new("forms")
    }
}

impl FormRenderer for MockFormRenderer {
    fn render(
        &self,
        entry_code: EntryCode,
        registration: NewRegistration,
    ) -> Pin<Box<dyn Future<Output = RenderResult<RenderedForm>> + Send + '_>> {
        Box::pin(async move {
            // Simulate layout-engine latency
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

            let file_name = format!("form_{entry_code}.png");
            let file_path = format!("{}/{}", self.output_dir, file_name);

            tracing::info!(
                entry_code = entry_code.as_str(),
                participant = %format!("{} {}", registration.first_name, registration.last_name),
                file = %file_path,
                "Mock application form rendered"
            );

            Ok(RenderedForm {
                file_name,
                file_path,
            })
        })
    }
}
