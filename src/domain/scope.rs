//! Region scope resolution.
//!
//! Turns the user's region list into the concrete pages of one target
//! file that each rectangle applies to. The same rules drive both the
//! removal pass and the preview overlay.

use std::collections::BTreeMap;

use super::page_range::ExcludedPages;
use super::region::{Rect, Region, Scope};

/// Rectangles to remove, grouped by 0-based page.
///
/// Pages iterate in ascending order; rectangles within a page keep the
/// order of the regions they came from.
pub type PageRects = BTreeMap<usize, Vec<Rect>>;

/// Pages of the target file that `region` applies to.
///
/// A page the target file does not have resolves to nothing.
pub fn targets_for(region: &Region, target_file_index: usize, page_count: usize) -> Vec<usize> {
    let same_file = region.file_index == target_file_index;

    match region.scope {
        Scope::AllFiles => (0..page_count).collect(),
        Scope::AllPagesOfFile if same_file => (0..page_count).collect(),
        Scope::AllPagesOfFile => Vec::new(),
        Scope::Current | Scope::Unrecognized => {
            if same_file && region.page < page_count {
                vec![region.page]
            } else {
                Vec::new()
            }
        }
    }
}

/// Groups every region's rectangle by the target pages it lands on,
/// leaving out excluded pages.
pub fn applicable_regions(
    regions: &[Region],
    excluded: &ExcludedPages,
    target_file_index: usize,
    page_count: usize,
) -> PageRects {
    let mut page_rects = PageRects::new();

    for region in regions {
        for page in targets_for(region, target_file_index, page_count) {
            if excluded.excludes_index(page) {
                continue;
            }
            page_rects.entry(page).or_default().push(region.rect);
        }
    }

    page_rects
}

/// Number of regions that touch at least one page of the target file.
pub fn count_applicable(regions: &[Region], target_file_index: usize, page_count: usize) -> usize {
    regions
        .iter()
        .filter(|r| !targets_for(r, target_file_index, page_count).is_empty())
        .count()
}

/// A region outline to draw over a previewed page.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewRegion {
    /// 1-based position in the region list.
    pub number: usize,
    pub rect: Rect,
    pub scope: Scope,
}

impl PreviewRegion {
    /// Caption such as `2 - all pages of this file`.
    pub fn caption(&self) -> String {
        format!("{} - {}", self.number, self.scope.label())
    }
}

/// Regions whose outline belongs on the given page of the given file.
///
/// Exclusions are not applied here; the preview shows what the user
/// drew, the removal pass decides what is skipped.
pub fn preview_regions(regions: &[Region], file_index: usize, page: usize) -> Vec<PreviewRegion> {
    regions
        .iter()
        .enumerate()
        .filter(|(_, region)| {
            let same_file = region.file_index == file_index;
            match region.scope {
                Scope::AllFiles => true,
                Scope::AllPagesOfFile => same_file,
                Scope::Current | Scope::Unrecognized => same_file && region.page == page,
            }
        })
        .map(|(idx, region)| PreviewRegion {
            number: idx + 1,
            rect: region.rect,
            scope: region.scope,
        })
        .collect()
}
