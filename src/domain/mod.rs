//! Domain models and pure logic.
//!
//! Everything here is independent of the PDF backend: page range
//! parsing, output naming, the region model and the rules that map a
//! region's scope onto the pages of a target file.

pub mod files;
pub mod output_path;
pub mod page_range;
pub mod region;
pub mod scope;

pub use files::{collect_pdfs_in_dir, validate_pdf_file, FileEntry, FileStatus};
pub use output_path::{resolve_output_path, DEFAULT_SUFFIX};
pub use page_range::{format_page_range, parse_page_range, ExcludedPages, PageSet};
pub use region::{collect_text_targets, FillMode, Rect, Region, Scope, TextTarget};
pub use scope::{applicable_regions, preview_regions, targets_for, PageRects, PreviewRegion};
