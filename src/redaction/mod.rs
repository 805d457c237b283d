//! Region and text removal against an open PDF document.
//!
//! The engine is written against the [`RedactableDocument`] seam so the
//! scope and batch logic never depend on which library strips content.
//! [`MupdfBackend`] is the production implementation.

pub mod document;
pub mod engine;
pub mod mupdf_backend;

pub use mupdf_backend::{MupdfBackend, MupdfDocument};
pub use document::{DocumentBackend, RedactableDocument, SaveOptions};
pub use engine::{RedactionEngine, RegionRedactionResult, TextMatchCounts};

use crate::error::{RemoverError, RemoverResult};
use std::path::Path;

/// Extracts the text of a PDF, for checking what a cleaned copy still
/// contains.
pub fn extract_text(input: &Path) -> RemoverResult<String> {
    let bytes = std::fs::read(input).map_err(|e| RemoverError::Io {
        path: input.to_path_buf(),
        source: e,
    })?;

    pdf_extract::extract_text_from_mem(&bytes).map_err(|e| RemoverError::Backend {
        backend: "pdf-extract".to_string(),
        message: format!("Text extraction failed for '{}': {}", input.display(), e),
        source: None,
    })
}
