//! Error types for the watermark removal library.
//!
//! Errors are grouped by where they come from: the filesystem, the PDF
//! backend, user input that is rejected before a run starts, and the
//! persisted configuration.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for library operations.
pub type RemoverResult<T> = Result<T, RemoverError>;

/// Boxed error used as the optional cause of backend failures.
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Error type for all watermark removal operations.
#[derive(Debug, Error)]
pub enum RemoverError {
    /// Error occurred while reading or writing files. The path is empty
    /// when the failing call did not name one.
    #[error("IO error{}: {source}", describe_path(path))]
    Io { path: PathBuf, source: io::Error },

    /// Error occurred while opening, editing or saving a document
    #[error(
        "PDF processing error{}: {message}",
        page.map(|p| format!(" on page {}", p)).unwrap_or_default()
    )]
    PdfProcessing {
        message: String,
        /// 1-based page number, when the failure is page specific
        page: Option<usize>,
        source: Option<BoxedSource>,
    },

    /// Backend-specific error (MuPDF, LoPDF, etc.)
    #[error("{backend} backend error: {message}")]
    Backend {
        backend: String,
        message: String,
        source: Option<BoxedSource>,
    },

    /// Input rejected before a run is allowed to start
    #[error("Invalid input for '{parameter}': {reason}")]
    InvalidInput { parameter: String, reason: String },

    /// Configuration file could not be read or written
    #[error("Config error for '{}': {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    /// The batch worker thread terminated abnormally
    #[error("Batch worker failed: {0}")]
    Worker(String),
}

impl RemoverError {
    /// Shorthand for an [`RemoverError::InvalidInput`].
    pub fn invalid_input(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Wraps a MuPDF failure.
    pub fn mupdf(message: impl Into<String>, source: mupdf::Error) -> Self {
        Self::Backend {
            backend: "MuPDF".to_string(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

fn describe_path(path: &std::path::Path) -> String {
    if path.as_os_str().is_empty() {
        String::new()
    } else {
        format!(" for path '{}'", path.display())
    }
}

impl From<io::Error> for RemoverError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<lopdf::Error> for RemoverError {
    fn from(err: lopdf::Error) -> Self {
        Self::Backend {
            backend: "LoPDF".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
