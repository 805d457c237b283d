//! The PDF capability the engine is written against.
//!
//! Removal happens in two explicit steps per page: mark one or more
//! areas, then commit the removal once. Backends decide how content is
//! physically stripped; callers only see this contract.

use std::path::Path;

use crate::domain::{FillMode, Rect};
use crate::error::RemoverResult;

/// How a document is written back to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveOptions {
    /// Drop unreferenced objects and renumber (0 disables).
    pub garbage_level: u8,
    /// Deflate content streams.
    pub compress_streams: bool,
    /// Try to re-encode images. Failure falls back to a save without it.
    pub recompress_images: bool,
}

impl SaveOptions {
    /// Full clean-up used for every cleaned copy.
    pub fn optimized() -> Self {
        Self {
            garbage_level: 4,
            compress_streams: true,
            recompress_images: true,
        }
    }
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self::optimized()
    }
}

/// An open document that supports area removal.
///
/// Page indices are 0-based. Implementations own their document handle
/// exclusively; dropping the value closes the document.
pub trait RedactableDocument {
    fn page_count(&self) -> usize;

    /// Marks an area of a page for removal.
    fn mark_area(&mut self, page: usize, rect: Rect, fill: FillMode) -> RemoverResult<()>;

    /// Finds every occurrence of a literal on a page.
    fn search_text(&mut self, page: usize, needle: &str) -> RemoverResult<Vec<Rect>>;

    /// Removes everything marked on the page.
    ///
    /// Images inside marked areas lose their pixels, line art touching
    /// them is removed and text is stripped from the content stream.
    fn apply_marks(&mut self, page: usize) -> RemoverResult<()>;

    fn save(&mut self, output: &Path, options: &SaveOptions) -> RemoverResult<()>;
}

/// Opens documents for the batch worker.
pub trait DocumentBackend: Send + Sync {
    fn open(&self, path: &Path) -> RemoverResult<Box<dyn RedactableDocument>>;

    /// Returns a human-readable name for this backend.
    fn name(&self) -> &str;
}
