//! Applies region and text removal to one open document.

use tracing::debug;

use super::document::RedactableDocument;
use crate::domain::{ExcludedPages, FillMode, PageRects, TextTarget};
use crate::error::RemoverResult;

/// Statistics about a region removal pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionRedactionResult {
    /// Rectangles marked across all pages
    pub areas_marked: usize,

    /// Pages on which removal was committed
    pub pages_modified: usize,
}

impl RegionRedactionResult {
    /// Returns true if any removal was applied.
    pub fn has_redactions(&self) -> bool {
        self.areas_marked > 0
    }
}

/// Matches found per text literal, in the order the literals were given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextMatchCounts {
    counts: Vec<(String, usize)>,
}

impl TextMatchCounts {
    fn with_targets(texts: &[TextTarget]) -> Self {
        let mut counts: Vec<(String, usize)> = Vec::with_capacity(texts.len());
        for text in texts {
            if !counts.iter().any(|(t, _)| t == text.as_str()) {
                counts.push((text.as_str().to_string(), 0));
            }
        }
        Self { counts }
    }

    fn add(&mut self, text: &str, found: usize) {
        if let Some((_, count)) = self.counts.iter_mut().find(|(t, _)| t == text) {
            *count += found;
        }
    }

    /// Matches for one literal, `None` if it was not searched for.
    pub fn get(&self, text: &str) -> Option<usize> {
        self.counts
            .iter()
            .find(|(t, _)| t == text)
            .map(|(_, count)| *count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(t, c)| (t.as_str(), *c))
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, c)| c).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Removal engine bound to one open document.
///
/// Every page touched gets exactly one commit, after all of its areas
/// have been marked.
pub struct RedactionEngine<'a> {
    doc: &'a mut dyn RedactableDocument,
}

impl<'a> RedactionEngine<'a> {
    pub fn new(doc: &'a mut dyn RedactableDocument) -> Self {
        Self { doc }
    }

    /// Marks every rectangle of every listed page, then commits once per page.
    pub fn apply_region_redactions(
        &mut self,
        page_rects: &PageRects,
        fill: FillMode,
    ) -> RemoverResult<RegionRedactionResult> {
        let mut result = RegionRedactionResult::default();

        for (&page, rects) in page_rects {
            if rects.is_empty() {
                continue;
            }

            for rect in rects {
                self.doc.mark_area(page, *rect, fill)?;
            }
            self.doc.apply_marks(page)?;

            debug!(page = page + 1, areas = rects.len(), "region removal applied");
            result.areas_marked += rects.len();
            result.pages_modified += 1;
        }

        Ok(result)
    }

    /// Searches every page for each literal and removes all matches.
    ///
    /// With `excluded` set, pages whose 1-based number it contains are
    /// skipped. The batch runner always passes `None`: text removal
    /// covers every page of every file.
    pub fn apply_text_redactions(
        &mut self,
        texts: &[TextTarget],
        excluded: Option<&ExcludedPages>,
    ) -> RemoverResult<TextMatchCounts> {
        let mut counts = TextMatchCounts::with_targets(texts);
        if counts.is_empty() {
            return Ok(counts);
        }

        let literals: Vec<String> = counts.iter().map(|(t, _)| t.to_string()).collect();

        for page in 0..self.doc.page_count() {
            if excluded.is_some_and(|ex| ex.excludes_index(page)) {
                continue;
            }

            let mut marked = 0;
            for text in &literals {
                let hits = self.doc.search_text(page, text)?;
                for rect in &hits {
                    self.doc.mark_area(page, *rect, FillMode::Transparent)?;
                }
                counts.add(text, hits.len());
                marked += hits.len();
            }

            if marked > 0 {
                self.doc.apply_marks(page)?;
                debug!(page = page + 1, matches = marked, "text removal applied");
            }
        }

        Ok(counts)
    }
}
