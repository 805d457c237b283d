//! End-to-end removal with the MuPDF backend on generated PDFs.

mod common;

use anyhow::Result;
use common::*;
use mupdf::{Colorspace, Matrix};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use watermark_remover::domain::resolve_output_path;
use watermark_remover::{
    BatchRunner, DocumentBackend, FileEntry, FileStatus, FillMode, MupdfBackend, RedactionEngine,
    Region, RunRequest, SaveOptions, Scope, TextTarget,
};

// Global mutex to serialize MuPDF operations across tests
// MuPDF has thread-safety issues with font loading, so we need to ensure
// only one test uses MuPDF at a time
static MUPDF_LOCK: Mutex<()> = Mutex::new(());

macro_rules! with_mupdf_lock {
    ($body:expr) => {{
        let _guard = MUPDF_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        $body
    }};
}

fn run(request: RunRequest) -> Result<watermark_remover::RunSummary> {
    let runner = BatchRunner::new(Arc::new(MupdfBackend::new()));
    Ok(runner.start(request)?.join()?)
}

/// Decoded content streams of a 1-based page, as LoPDF sees them.
fn page_content(path: &Path, page: u32) -> Result<String> {
    let doc = ::lopdf::Document::load(path)?;
    let page_id = *doc
        .get_pages()
        .get(&page)
        .ok_or_else(|| anyhow::anyhow!("no page {}", page))?;
    Ok(String::from_utf8_lossy(&doc.get_page_content(page_id)?).into_owned())
}

/// RGB of every pixel inside `(x0, y0, x1, y1)` on a 0-based page,
/// rendered at 72 dpi.
fn rendered_pixels(path: &Path, page: i32, area: (u32, u32, u32, u32)) -> Result<Vec<[u8; 3]>> {
    let doc = mupdf::Document::open(path)?;
    let pixmap = doc.load_page(page)?.to_pixmap(
        &Matrix::IDENTITY,
        &Colorspace::device_rgb(),
        false,
        false,
    )?;
    let (n, stride) = (pixmap.n() as usize, pixmap.stride() as usize);
    let samples = pixmap.samples();

    let mut pixels = Vec::new();
    for y in area.1..area.3.min(pixmap.height()) {
        for x in area.0..area.2.min(pixmap.width()) {
            let at = y as usize * stride + x as usize * n;
            pixels.push([samples[at], samples[at + 1], samples[at + 2]]);
        }
    }
    Ok(pixels)
}

#[test]
fn test_region_on_all_pages_respects_exclusions() -> Result<()> {
    with_mupdf_lock!({
        let dir = TempDir::new()?;
        let input = create_numbered_sample(&dir.path().join("doc.pdf"))?;

        let original = extract_text(&input)?;
        assert!(original.contains("SAMPLE 1"));
        assert!(original.contains("SAMPLE 3"));

        // Occupy the first choice so the run has to pick the next one.
        let taken = resolve_output_path(&input, "[watermark-removed]");
        std::fs::copy(&input, &taken)?;
        let expected = resolve_output_path(&input, "[watermark-removed]");
        assert!(expected.ends_with("doc[watermark-removed]_1.pdf"));

        let request = RunRequest::new(vec![FileEntry::open(&input)])
            .with_regions(vec![Region::new(
                watermark_band(),
                0,
                Scope::AllPagesOfFile,
                0,
            )])
            .with_excluded_pages("2");
        let summary = run(request)?;

        assert_eq!(summary.files[0].status, FileStatus::Done);
        assert!(expected.exists());
        assert!(is_valid_pdf(&expected));
        assert_eq!(page_count(&expected)?, 3);

        let cleaned = extract_text(&expected)?;
        assert!(!cleaned.contains("SAMPLE 1"));
        assert!(cleaned.contains("SAMPLE 2"));
        assert!(!cleaned.contains("SAMPLE 3"));
        for n in 1..=3 {
            assert!(cleaned.contains(&format!("Body of page {}", n)));
        }

        // The input is never modified.
        assert_eq!(extract_text(&input)?, original);
        Ok(())
    })
}

#[test]
fn test_text_removal_reaches_every_page() -> Result<()> {
    with_mupdf_lock!({
        let dir = TempDir::new()?;
        let input = TestPdfBuilder::new()
            .with_pages(2)
            .with_watermark("CONFIDENTIAL")
            .with_body("Quarterly figures {n}")
            .build(&dir.path().join("report.pdf"))?;

        let request = RunRequest::new(vec![FileEntry::open(&input)])
            .with_texts(vec![TextTarget::new("CONFIDENTIAL").unwrap()])
            .with_excluded_pages("1-2");
        let summary = run(request)?;

        assert_eq!(summary.stats.success, 1);
        let output = dir.path().join("report[watermark-removed].pdf");
        let cleaned = extract_text(&output)?;
        assert!(!cleaned.contains("CONFIDENTIAL"));
        assert!(cleaned.contains("Quarterly figures 1"));
        assert!(cleaned.contains("Quarterly figures 2"));
        Ok(())
    })
}

#[test]
fn test_unreadable_file_fails_without_stopping() -> Result<()> {
    with_mupdf_lock!({
        let dir = TempDir::new()?;
        let broken = dir.path().join("broken.pdf");
        std::fs::write(&broken, b"not a pdf")?;
        let good = create_numbered_sample(&dir.path().join("good.pdf"))?;

        let request = RunRequest::new(vec![FileEntry::new(&broken, 0), FileEntry::open(&good)])
            .with_texts(vec![TextTarget::new("SAMPLE").unwrap()]);
        let summary = run(request)?;

        assert_eq!(summary.files[0].status, FileStatus::Failed);
        assert_eq!(summary.files[1].status, FileStatus::Done);
        assert!(!dir.path().join("broken[watermark-removed].pdf").exists());
        assert!(dir.path().join("good[watermark-removed].pdf").exists());
        Ok(())
    })
}

#[test]
fn test_white_fill_paints_removed_areas_white() -> Result<()> {
    with_mupdf_lock!({
        let dir = TempDir::new()?;
        let input = create_numbered_sample(&dir.path().join("doc.pdf"))?;

        let request = RunRequest::new(vec![FileEntry::open(&input)])
            .with_regions(vec![Region::new(
                watermark_band(),
                0,
                Scope::AllPagesOfFile,
                0,
            )])
            .with_fill_mode(FillMode::OpaqueWhite);
        let summary = run(request)?;
        assert_eq!(summary.files[0].status, FileStatus::Done);

        let output = dir.path().join("doc[watermark-removed].pdf");
        let cleaned = extract_text(&output)?;
        assert!(!cleaned.contains("SAMPLE"));
        assert!(cleaned.contains("Body of page 2"));

        // A white fill is drawn; nothing in the band renders dark.
        assert!(page_content(&output, 1)?.contains("1 1 1 rg"));
        let band = rendered_pixels(&output, 0, (10, 45, 585, 105))?;
        assert!(!band.is_empty());
        assert!(band.iter().all(|px| px.iter().all(|&c| c >= 250)));
        Ok(())
    })
}

#[test]
fn test_tiled_text_beyond_search_cap_is_fully_removed() -> Result<()> {
    with_mupdf_lock!({
        let dir = TempDir::new()?;
        let input = TestPdfBuilder::new()
            .with_watermark("Header")
            .with_tiles("TILE", 40)
            .build(&dir.path().join("tiled.pdf"))?;
        let output = dir.path().join("tiled-clean.pdf");

        // Start far below the number of copies on the page.
        let mut doc = MupdfBackend::new().with_max_hits(8).open(&input)?;
        let counts = RedactionEngine::new(&mut *doc)
            .apply_text_redactions(&[TextTarget::new("TILE").unwrap()], None)?;
        doc.save(&output, &SaveOptions::default())?;
        drop(doc);

        assert_eq!(counts.get("TILE"), Some(40));
        let cleaned = extract_text(&output)?;
        assert!(!cleaned.contains("TILE"));
        assert!(cleaned.contains("Header"));
        Ok(())
    })
}
