//! Batch file list entries.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RemoverError, RemoverResult};

/// Processing state of one file in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    #[default]
    Pending,
    Processing,
    Done,
    Failed,
}

impl FileStatus {
    /// Done and Failed are final for a run.
    pub fn is_finished(&self) -> bool {
        matches!(self, FileStatus::Done | FileStatus::Failed)
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FileStatus::Pending => "pending",
            FileStatus::Processing => "processing",
            FileStatus::Done => "done",
            FileStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// One PDF in the batch list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: PathBuf,
    pub display_name: String,
    /// Page count read when the file was added; 0 if it could not be read.
    pub page_count: usize,
    pub status: FileStatus,
}

impl FileEntry {
    /// Creates a pending entry with an explicit page count.
    pub fn new(path: impl Into<PathBuf>, page_count: usize) -> Self {
        let path = path.into();
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            display_name,
            page_count,
            status: FileStatus::Pending,
        }
    }

    /// Creates a pending entry, reading the page count from disk.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let page_count = read_page_count(&path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "could not read page count");
            0
        });
        Self::new(path, page_count)
    }
}

/// Returns true if the path carries a `.pdf` extension, in any case.
pub fn is_pdf_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Counts pages with LoPDF without opening the document for editing.
pub fn read_page_count(path: &Path) -> RemoverResult<usize> {
    let doc = lopdf::Document::load(path)?;
    Ok(doc.get_pages().len())
}

/// Checks that a path is an existing, readable PDF with at least one page.
pub fn validate_pdf_file(path: &Path) -> RemoverResult<usize> {
    let invalid = |reason: String| RemoverError::invalid_input(path.display().to_string(), reason);

    if !path.exists() {
        return Err(invalid("file does not exist".to_string()));
    }
    if !is_pdf_file(path) {
        return Err(invalid("not a PDF file".to_string()));
    }

    let pages = read_page_count(path).map_err(|e| invalid(format!("cannot open PDF: {}", e)))?;
    if pages == 0 {
        return Err(invalid("PDF has no pages".to_string()));
    }
    Ok(pages)
}

/// Lists the PDF files directly inside `dir`, sorted by path.
pub fn collect_pdfs_in_dir(dir: &Path) -> RemoverResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| RemoverError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut pdfs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| RemoverError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_file() && is_pdf_file(&path) {
            pdfs.push(path);
        }
    }

    pdfs.sort();
    Ok(pdfs)
}

/// Appends paths not already in the list, keeping first-seen order.
pub fn push_unique(list: &mut Vec<PathBuf>, paths: impl IntoIterator<Item = PathBuf>) {
    for path in paths {
        if !list.contains(&path) {
            list.push(path);
        }
    }
}
