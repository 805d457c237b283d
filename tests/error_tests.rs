//! Error handling tests.
//!
//! Covers error display, conversions and the validation errors that
//! block a run before it starts.

use std::error::Error as StdError;
use std::io;
use std::path::PathBuf;
use tempfile::TempDir;
use watermark_remover::domain::files::validate_pdf_file;
use watermark_remover::error::{RemoverError, RemoverResult};
use watermark_remover::{AppConfig, Rect, Region, Scope};

#[test]
fn test_io_error_display() {
    let err = RemoverError::Io {
        path: PathBuf::from("/test/path.pdf"),
        source: io::Error::new(io::ErrorKind::NotFound, "file not found"),
    };

    let display = err.to_string();
    assert!(display.contains("/test/path.pdf"));
    assert!(display.contains("IO error"));
    assert!(display.contains("file not found"));
    assert!(err.source().is_some());
}

#[test]
fn test_backend_error_display() {
    let err = RemoverError::Backend {
        backend: "MuPDF".to_string(),
        message: "save failed".to_string(),
        source: None,
    };
    assert_eq!(err.to_string(), "MuPDF backend error: save failed");
}

#[test]
fn test_config_error_display() {
    let err = RemoverError::Config {
        path: PathBuf::from("config.json"),
        reason: "expected value".to_string(),
    };
    assert!(err.to_string().contains("config.json"));
    assert!(err.to_string().contains("expected value"));
}

#[test]
fn test_io_error_conversion() {
    fn fails() -> RemoverResult<()> {
        Err::<(), _>(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))?;
        Ok(())
    }

    let err = fails().unwrap_err();
    assert!(matches!(err, RemoverError::Io { .. }));
    assert!(err.to_string().contains("denied"));
    assert!(err.source().is_some());
}

#[test]
fn test_errors_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RemoverError>();
}

#[test]
fn test_anyhow_wraps_remover_error() {
    let err: anyhow::Error = RemoverError::invalid_input("suffix", "empty").into();
    assert!(err.downcast_ref::<RemoverError>().is_some());
}

#[test]
fn test_region_validation_errors() {
    let tiny = Region::new(Rect::new(10.0, 10.0, 12.0, 100.0), 0, Scope::Current, 0);
    let err = tiny.validate().unwrap_err();
    assert!(matches!(err, RemoverError::InvalidInput { .. }));

    let err = "x:1,2,3,4".parse::<Region>().unwrap_err();
    assert!(err.to_string().contains("not a number"));

    let err = "0:1,2,a,4".parse::<Region>().unwrap_err();
    assert!(err.to_string().contains("non-numeric"));

    let err = "0:0,0,50,50:sideways".parse::<Region>().unwrap_err();
    assert!(err.to_string().contains("unknown scope"));
}

#[test]
fn test_file_validation_errors() {
    let dir = TempDir::new().unwrap();

    let missing = dir.path().join("missing.pdf");
    let err = validate_pdf_file(&missing).unwrap_err();
    assert!(err.to_string().contains("does not exist"));

    let text = dir.path().join("notes.txt");
    std::fs::write(&text, "hello").unwrap();
    let err = validate_pdf_file(&text).unwrap_err();
    assert!(err.to_string().contains("not a PDF"));

    let garbage = dir.path().join("garbage.pdf");
    std::fs::write(&garbage, "not a pdf").unwrap();
    let err = validate_pdf_file(&garbage).unwrap_err();
    assert!(err.to_string().contains("cannot open PDF"));
}

#[test]
fn test_malformed_config_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "[1, 2").unwrap();

    let err = AppConfig::load(&path).unwrap_err();
    assert!(matches!(err, RemoverError::Config { .. }));
    assert!(err.to_string().contains("config.json"));
}
