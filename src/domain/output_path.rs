//! Output file naming.

use std::path::{Path, PathBuf};

/// Suffix appended to the file stem of every cleaned copy.
pub const DEFAULT_SUFFIX: &str = "[watermark-removed]";

/// Derives a sibling output path that does not exist yet.
///
/// The first candidate is `{stem}{suffix}{ext}` next to the input. While
/// a candidate exists, `{stem}{suffix}_{n}{ext}` is tried with `n`
/// counting up from 1. The result depends only on the filesystem state
/// at call time, so two calls without writing in between agree.
pub fn resolve_output_path(input: &Path, suffix: &str) -> PathBuf {
    let dir = input.parent().unwrap_or_else(|| Path::new(""));
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = input
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut candidate = dir.join(format!("{}{}{}", stem, suffix, ext));
    let mut counter = 1usize;
    while candidate.exists() {
        candidate = dir.join(format!("{}{}_{}{}", stem, suffix, counter, ext));
        counter += 1;
    }

    candidate
}
