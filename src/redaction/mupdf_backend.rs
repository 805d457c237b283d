//! MuPDF backend.
//!
//! Areas are marked as PDF redaction annotations and committed with
//! `pdf_redact_page`, so removed content is gone from the file rather
//! than hidden. MuPDF's own redaction boxes are always black, so they
//! stay off; areas marked with [`FillMode::OpaqueWhite`] get a white
//! fill appended to the page content after the commit.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use mupdf::pdf::{
    PdfAnnotation, PdfAnnotationType, PdfDocument, PdfObject, PdfPage, PdfWriteOptions,
};
use mupdf::{Matrix, Rect as MuRect};
use tracing::{debug, warn};

use super::document::{DocumentBackend, RedactableDocument, SaveOptions};
use crate::domain::{FillMode, Rect};
use crate::error::{RemoverError, RemoverResult};

/// Search cap the adaptive search never grows past.
const SEARCH_HIT_CEILING: u32 = 1 << 16;

/// Opens documents with MuPDF.
#[derive(Debug, Clone)]
pub struct MupdfBackend {
    /// Initial search cap per literal per page
    max_hits: u32,
}

impl MupdfBackend {
    pub fn new() -> Self {
        Self { max_hits: 256 }
    }

    /// Sets the initial number of search hits asked for per literal and
    /// page. A page with more hits is searched again with a larger cap.
    pub fn with_max_hits(mut self, max_hits: u32) -> Self {
        self.max_hits = max_hits;
        self
    }
}

impl Default for MupdfBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBackend for MupdfBackend {
    fn open(&self, path: &Path) -> RemoverResult<Box<dyn RedactableDocument>> {
        let path_str = path.to_str().ok_or_else(|| {
            RemoverError::invalid_input("input", "Path contains invalid UTF-8")
        })?;

        let doc = PdfDocument::open(path_str).map_err(|e| RemoverError::PdfProcessing {
            message: format!("Failed to open '{}' with MuPDF", path.display()),
            page: None,
            source: Some(Box::new(e)),
        })?;

        let page_count = doc
            .page_count()
            .map_err(|e| RemoverError::mupdf("Failed to get page count", e))?;

        debug!(path = %path.display(), pages = page_count, "opened document");

        Ok(Box::new(MupdfDocument {
            doc,
            page_count: page_count.max(0) as usize,
            marked: BTreeMap::new(),
            max_hits: self.max_hits,
        }))
    }

    fn name(&self) -> &str {
        "MuPDF"
    }
}

/// A loaded page holding uncommitted redaction annotations.
struct MarkedPage {
    /// First annotation created on the page; it leads back to the raw
    /// page handle when the marks are applied.
    anchor: Option<PdfAnnotation>,
    /// Areas painted white once the marks are applied.
    white: Vec<Rect>,
    page: PdfPage,
}

/// A document opened by [`MupdfBackend`].
pub struct MupdfDocument {
    doc: PdfDocument,
    page_count: usize,
    marked: BTreeMap<usize, MarkedPage>,
    max_hits: u32,
}

impl MupdfDocument {
    fn load_page(&self, page: usize) -> RemoverResult<mupdf::Page> {
        if page >= self.page_count {
            return Err(RemoverError::PdfProcessing {
                message: format!("Page index {} out of range", page),
                page: Some(page + 1),
                source: None,
            });
        }

        self.doc
            .load_page(page as i32)
            .map_err(|e| RemoverError::PdfProcessing {
                message: format!("Failed to load page {}", page + 1),
                page: Some(page + 1),
                source: Some(Box::new(e)),
            })
    }

    fn marked_page(&mut self, page: usize) -> RemoverResult<&mut MarkedPage> {
        if !self.marked.contains_key(&page) {
            let loaded = self.load_page(page)?;
            let pdf_page = PdfPage::try_from(loaded).map_err(|_| RemoverError::PdfProcessing {
                message: "Page is not a PDF page".to_string(),
                page: Some(page + 1),
                source: None,
            })?;
            self.marked.insert(
                page,
                MarkedPage {
                    anchor: None,
                    white: Vec::new(),
                    page: pdf_page,
                },
            );
        }

        self.marked
            .get_mut(&page)
            .ok_or_else(|| RemoverError::PdfProcessing {
                message: "Marked page vanished".to_string(),
                page: Some(page + 1),
                source: None,
            })
    }

    fn write(&self, output: &str, options: &SaveOptions, images: bool) -> Result<(), mupdf::Error> {
        let mut write_options = PdfWriteOptions::default();
        write_options.set_garbage_level(i32::from(options.garbage_level));
        write_options.set_compress(options.compress_streams);
        write_options.set_compress_images(images);
        self.doc.save_with_options(output, write_options)
    }
}

fn guarded_call_failed(what: &str, page: usize, message: String) -> RemoverError {
    RemoverError::PdfProcessing {
        message: format!("{}: {}", what, message),
        page: Some(page + 1),
        source: None,
    }
}

impl RedactableDocument for MupdfDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn mark_area(&mut self, page: usize, rect: Rect, fill: FillMode) -> RemoverResult<()> {
        let marked = self.marked_page(page)?;

        let annot = marked
            .page
            .create_annotation(PdfAnnotationType::Redact)
            .map_err(|e| RemoverError::PdfProcessing {
                message: "Failed to create redaction annotation".to_string(),
                page: Some(page + 1),
                source: Some(Box::new(e)),
            })?;

        let mu_rect = MuRect {
            x0: rect.x0,
            y0: rect.y0,
            x1: rect.x1,
            y1: rect.y1,
        };

        unsafe { ffi::set_annotation_rect(&annot, mu_rect) }
            .map_err(|message| guarded_call_failed("Failed to place redaction area", page, message))?;

        if fill == FillMode::OpaqueWhite {
            marked.white.push(rect);
        }

        if marked.anchor.is_none() {
            marked.anchor = Some(annot);
        }
        Ok(())
    }

    fn search_text(&mut self, page: usize, needle: &str) -> RemoverResult<Vec<Rect>> {
        let loaded = self.load_page(page)?;

        // Bounding rectangle of each hit quad
        search_uncapped(self.max_hits, |cap| {
            loaded.search(needle, cap).map(|hits| {
                hits.iter()
                    .map(|quad| {
                        Rect::new(
                            quad.ul.x.min(quad.ll.x).min(quad.ur.x).min(quad.lr.x),
                            quad.ul.y.min(quad.ll.y).min(quad.ur.y).min(quad.lr.y),
                            quad.ul.x.max(quad.ll.x).max(quad.ur.x).max(quad.lr.x),
                            quad.ul.y.max(quad.ll.y).max(quad.ur.y).max(quad.lr.y),
                        )
                    })
                    .collect()
            })
        })
        .map_err(|e| RemoverError::mupdf(format!("Search failed for '{}'", needle), e))
    }

    fn apply_marks(&mut self, page: usize) -> RemoverResult<()> {
        let Some(marked) = self.marked.remove(&page) else {
            return Ok(());
        };
        let Some(anchor) = marked.anchor.as_ref() else {
            return Ok(());
        };

        let redacted = unsafe { ffi::redact_page(anchor) }
            .map_err(|message| guarded_call_failed("Failed to apply redactions", page, message))?;
        if !redacted {
            debug!(page = page + 1, "no content under the marked areas");
        }

        if !marked.white.is_empty() {
            paint_white(&mut self.doc, &marked.page, &marked.white).map_err(|e| {
                RemoverError::PdfProcessing {
                    message: "Failed to paint removed areas white".to_string(),
                    page: Some(page + 1),
                    source: Some(Box::new(e)),
                }
            })?;
        }
        Ok(())
    }

    fn save(&mut self, output: &Path, options: &SaveOptions) -> RemoverResult<()> {
        let output_str = output.to_str().ok_or_else(|| {
            RemoverError::invalid_input("output", "Path contains invalid UTF-8")
        })?;

        if options.recompress_images {
            match self.write(output_str, options, true) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(
                        output = %output.display(),
                        error = %e,
                        "image re-encoding failed, saving without it"
                    );
                }
            }
        }

        self.write(output_str, options, false)
            .map_err(|e| RemoverError::PdfProcessing {
                message: format!("Failed to save '{}'", output.display()),
                page: None,
                source: Some(Box::new(e)),
            })
    }
}

/// Fills `areas` (page space) with white on top of everything else on
/// the page.
///
/// The existing content is wrapped in `q`/`Q` so whatever state it
/// leaves behind cannot shift the fill.
fn paint_white(doc: &mut PdfDocument, page: &PdfPage, areas: &[Rect]) -> Result<(), mupdf::Error> {
    let mut page_obj = page.object();
    let to_pdf_space = invert(page_obj.page_ctm()?).ok_or(mupdf::Error::InvalidPdfDocument)?;

    let open = new_content_stream(doc, "q\n")?;
    let fill = new_content_stream(doc, &white_fill_ops(&to_pdf_space, areas))?;

    let mut contents = doc.new_array()?;
    contents.array_push(open)?;
    if let Some(existing) = page_obj.get_dict("Contents")? {
        if existing.is_array()? {
            for i in 0..existing.len()? {
                if let Some(stream) = existing.get_array(i as i32)? {
                    contents.array_push(stream)?;
                }
            }
        } else {
            contents.array_push(existing)?;
        }
    }
    contents.array_push(fill)?;

    page_obj.dict_put("Contents", contents)
}

fn new_content_stream(doc: &mut PdfDocument, ops: &str) -> Result<PdfObject, mupdf::Error> {
    let dict = doc.new_dict()?;
    let mut stream = doc.add_object(&dict)?;
    stream.write_stream_string(ops)?;
    Ok(stream)
}

/// Content operators that close the wrapped page content and fill each
/// area white. Areas are in page space; `to_pdf_space` maps them back.
fn white_fill_ops(to_pdf_space: &Matrix, areas: &[Rect]) -> String {
    let m = to_pdf_space;
    let mut ops = String::from("Q\nq\n");
    let _ = writeln!(ops, "{} {} {} {} {} {} cm", m.a, m.b, m.c, m.d, m.e, m.f);
    ops.push_str("1 1 1 rg\n");
    for area in areas {
        let _ = writeln!(
            ops,
            "{} {} {} {} re f",
            area.x0,
            area.y0,
            area.width(),
            area.height()
        );
    }
    ops.push_str("Q\n");
    ops
}

/// Inverse of an affine matrix, `None` if it is singular.
fn invert(m: Matrix) -> Option<Matrix> {
    let det = m.a * m.d - m.b * m.c;
    if det.abs() < f32::EPSILON {
        return None;
    }
    let a = m.d / det;
    let b = -m.b / det;
    let c = -m.c / det;
    let d = m.a / det;
    Some(Matrix::new(a, b, c, d, -m.e * a - m.f * c, -m.e * b - m.f * d))
}

/// Runs `search` with a growing hit cap until it returns fewer hits than
/// it was allowed, so matches past the cap are never dropped.
fn search_uncapped<T, E>(
    initial: u32,
    mut search: impl FnMut(u32) -> Result<Vec<T>, E>,
) -> Result<Vec<T>, E> {
    let mut cap = initial.clamp(1, SEARCH_HIT_CEILING);
    loop {
        let hits = search(cap)?;
        let full = hits.len() >= cap as usize;
        if !full {
            return Ok(hits);
        }
        if cap >= SEARCH_HIT_CEILING {
            warn!(hits = hits.len(), "search hit ceiling reached, later matches on this page are kept");
            return Ok(hits);
        }
        cap = cap.saturating_mul(4).min(SEARCH_HIT_CEILING);
    }
}

/// MuPDF annotation and redaction calls the safe bindings do not expose
/// with explicit options. They go through `mupdf_guard.c`, which catches
/// MuPDF exceptions and hands back the message.
mod ffi {
    use std::ffi::{c_char, c_float, c_int, CStr};

    use mupdf::pdf::PdfAnnotation;
    use mupdf::{Context, Rect};
    use mupdf_sys::{fz_context, pdf_annot, pdf_document, pdf_page};

    const MESSAGE_LEN: usize = 256;

    extern "C" {
        fn guard_set_annot_rect(
            ctx: *mut fz_context,
            annot: *mut pdf_annot,
            x0: c_float,
            y0: c_float,
            x1: c_float,
            y1: c_float,
            err: *mut c_char,
            err_len: usize,
        ) -> c_int;

        fn guard_redact_page(
            ctx: *mut fz_context,
            doc: *mut pdf_document,
            page: *mut pdf_page,
            image_method: c_int,
            line_art: c_int,
            text: c_int,
            err: *mut c_char,
            err_len: usize,
        ) -> c_int;
    }

    #[repr(C)]
    struct PdfAnnotRaw {
        inner: *mut pdf_annot,
    }

    #[repr(C)]
    struct ContextRaw {
        inner: *mut fz_context,
    }

    /// The calling thread's context, the same one the safe bindings use.
    fn context() -> *mut fz_context {
        let ctx = Context::get();
        unsafe { std::mem::transmute::<&Context, &ContextRaw>(&ctx).inner }
    }

    fn annot_ptr(annot: &PdfAnnotation) -> *mut pdf_annot {
        unsafe { std::mem::transmute::<&PdfAnnotation, &PdfAnnotRaw>(annot).inner }
    }

    /// Runs a guarded call and turns a negative status into its message.
    fn guarded(call: impl FnOnce(*mut c_char, usize) -> c_int) -> Result<c_int, String> {
        let mut message = [0 as c_char; MESSAGE_LEN];
        let status = call(message.as_mut_ptr(), MESSAGE_LEN);
        if status < 0 {
            let text = unsafe { CStr::from_ptr(message.as_ptr()) }
                .to_string_lossy()
                .into_owned();
            return Err(if text.is_empty() {
                "unknown MuPDF error".to_string()
            } else {
                text
            });
        }
        Ok(status)
    }

    /// Sets the rectangle of a PDF annotation.
    ///
    /// # Safety
    /// The annotation must be valid and belong to a document opened on
    /// this thread.
    pub unsafe fn set_annotation_rect(annot: &PdfAnnotation, rect: Rect) -> Result<(), String> {
        let (ctx, annot) = (context(), annot_ptr(annot));
        guarded(|err, len| unsafe {
            guard_set_annot_rect(ctx, annot, rect.x0, rect.y0, rect.x1, rect.y1, err, len)
        })
        .map(|_| ())
    }

    /// Applies all redaction annotations on the page `anchor` sits on.
    ///
    /// Images are cleared pixel-wise, line art touching a marked area is
    /// removed and text is stripped. Nothing is drawn over the areas.
    /// Returns whether anything was redacted.
    ///
    /// # Safety
    /// Same requirements as [`set_annotation_rect`].
    pub unsafe fn redact_page(anchor: &PdfAnnotation) -> Result<bool, String> {
        let ctx = context();
        let page = mupdf_sys::pdf_annot_page(ctx, annot_ptr(anchor));
        if page.is_null() {
            return Err("annotation is not attached to a page".to_string());
        }
        let doc = (*page).doc;

        guarded(|err, len| unsafe {
            guard_redact_page(
                ctx,
                doc,
                page,
                mupdf_sys::PDF_REDACT_IMAGE_PIXELS as c_int,
                mupdf_sys::PDF_REDACT_LINE_ART_REMOVE_IF_TOUCHED as c_int,
                mupdf_sys::PDF_REDACT_TEXT_REMOVE as c_int,
                err,
                len,
            )
        })
        .map(|status| status > 0)
    }
}
