//! Batch removal of watermark regions and recurring text from PDF files.
//!
//! Users draw rectangles over watermarks and list literal strings to
//! strip. Each rectangle carries a scope (the page it was drawn on, every
//! page of its file, or every page of every file); an exclusion string
//! exempts pages from region removal. A batch run cleans each file on a
//! worker thread and writes a sibling copy named
//! `{stem}[watermark-removed]{ext}`.
//!
//! Removal is physical: content is stripped with MuPDF's redaction API,
//! not hidden under an overlay.
//!
//! # Architecture
//!
//! - [`domain`]: page ranges, output naming, regions and scope resolution
//! - [`redaction`]: the document capability seam, the removal engine and
//!   the MuPDF backend
//! - [`batch`]: the sequential worker, its control flags and events
//! - [`config`]: persisted settings
//! - [`error`]: error handling
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use watermark_remover::{
//!     BatchRunner, FileEntry, MupdfBackend, Rect, Region, RunRequest, Scope, TextTarget,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let files = vec![FileEntry::open("report.pdf")];
//! let request = RunRequest::new(files)
//!     .with_regions(vec![Region::new(
//!         Rect::new(400.0, 750.0, 590.0, 790.0),
//!         0,
//!         Scope::AllFiles,
//!         0,
//!     )])
//!     .with_texts(vec![TextTarget::new("CONFIDENTIAL").unwrap()])
//!     .with_excluded_pages("1");
//!
//! let runner = BatchRunner::new(Arc::new(MupdfBackend::new()));
//! let handle = runner.start(request)?;
//! let summary = handle.join()?;
//! println!("{} cleaned, {} failed", summary.stats.success, summary.stats.failed);
//! # Ok(())
//! # }
//! ```
//!
//! # Page Ranges
//!
//! ```
//! use watermark_remover::domain::{format_page_range, parse_page_range};
//!
//! let pages = parse_page_range("1-3, 5, 7-9");
//! assert_eq!(format_page_range(&pages), "1-3, 5, 7-9");
//! ```

// Public API
pub mod batch;
pub mod config;
pub mod domain;
pub mod error;
pub mod redaction;

// Re-exports for convenient access
pub use batch::{BatchRunner, RunControl, RunEvent, RunHandle, RunRequest, RunStats, RunSummary};
pub use config::AppConfig;
pub use domain::{
    ExcludedPages, FileEntry, FileStatus, FillMode, Rect, Region, Scope, TextTarget,
};
pub use error::{RemoverError, RemoverResult};
pub use redaction::{
    extract_text, DocumentBackend, MupdfBackend, RedactableDocument, RedactionEngine, SaveOptions,
};
