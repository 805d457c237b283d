//! Test fixtures and PDF builders.

use anyhow::Result;
use printpdf::*;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Builder for multi-page test PDFs.
///
/// Each page carries a watermark line near the top and a body line in
/// the middle. Text is drawn in Helvetica so it stays searchable.
#[derive(Debug, Clone)]
pub struct TestPdfBuilder {
    title: String,
    pages: usize,
    watermark: String,
    body: String,
    tiles: Option<(String, usize)>,
    page_width: Mm,
    page_height: Mm,
}

impl TestPdfBuilder {
    pub fn new() -> Self {
        Self {
            title: "Test Document".to_string(),
            pages: 1,
            watermark: "SAMPLE".to_string(),
            body: "Body text".to_string(),
            tiles: None,
            page_width: Mm(210.0),  // A4 width
            page_height: Mm(297.0), // A4 height
        }
    }

    pub fn with_pages(mut self, pages: usize) -> Self {
        self.pages = pages.max(1);
        self
    }

    /// Watermark line; `{n}` is replaced by the 1-based page number.
    pub fn with_watermark(mut self, watermark: &str) -> Self {
        self.watermark = watermark.to_string();
        self
    }

    /// Body line; `{n}` is replaced by the 1-based page number.
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    /// Repeats `text` `count` times per page in a four-column grid below
    /// the watermark, like a tiled watermark.
    pub fn with_tiles(mut self, text: &str, count: usize) -> Self {
        self.tiles = Some((text.to_string(), count));
        self
    }

    /// Builds the PDF and writes it to the specified path.
    pub fn build(self, output_path: &Path) -> Result<PathBuf> {
        let (doc, page1, layer1) =
            PdfDocument::new(&self.title, self.page_width, self.page_height, "Layer 1");
        let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;

        let mut layers = vec![doc.get_page(page1).get_layer(layer1)];
        for _ in 1..self.pages {
            let (page, layer) = doc.add_page(self.page_width, self.page_height, "Layer 1");
            layers.push(doc.get_page(page).get_layer(layer));
        }

        for (i, layer) in layers.iter().enumerate() {
            let n = (i + 1).to_string();
            // Top band: 270mm from the bottom edge.
            layer.use_text(
                self.watermark.replace("{n}", &n),
                24.0,
                Mm(20.0),
                Mm(270.0),
                &font,
            );
            layer.use_text(
                self.body.replace("{n}", &n),
                12.0,
                Mm(20.0),
                Mm(100.0),
                &font,
            );
            if let Some((text, count)) = &self.tiles {
                for k in 0..*count {
                    let (col, row) = ((k % 4) as f32, (k / 4) as f32);
                    layer.use_text(
                        text.clone(),
                        10.0,
                        Mm(20.0 + col * 45.0),
                        Mm(250.0 - row * 6.0),
                        &font,
                    );
                }
            }
        }

        doc.save(&mut BufWriter::new(fs::File::create(output_path)?))?;

        Ok(output_path.to_path_buf())
    }
}

impl Default for TestPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Region covering the watermark band of an A4 test page, in points
/// from the top-left corner.
pub fn watermark_band() -> watermark_remover::Rect {
    watermark_remover::Rect::new(0.0, 40.0, 595.0, 110.0)
}

/// Three-page document whose watermarks read "SAMPLE 1" .. "SAMPLE 3".
pub fn create_numbered_sample(path: &Path) -> Result<PathBuf> {
    TestPdfBuilder::new()
        .with_pages(3)
        .with_watermark("SAMPLE {n}")
        .with_body("Body of page {n}")
        .build(path)
}
