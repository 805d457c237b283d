//! Page range strings.
//!
//! Users type page exclusions as free text such as `1-5, 10, 15-20`.
//! Parsing is best-effort: segments that do not look like a page number
//! or an inclusive range are dropped without an error.

use std::fmt;
use std::ops::RangeInclusive;

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches the leading `N` or `A-B` of a segment.
fn segment_regex() -> &'static Regex {
    static PATTERN: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^(\d+)(?:-(\d+))?").expect("Valid page segment regex"));
    &PATTERN
}

/// A set of 1-based page numbers stored as sorted, disjoint runs.
///
/// Runs never touch: `1-3` and `4` merge into `1-4`. A range such as
/// `1-300000000` costs one run, not one entry per page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSet {
    runs: Vec<(usize, usize)>,
}

impl PageSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, page: usize) {
        self.insert_range(page, page);
    }

    /// Adds every page from `start` to `end` inclusive. Reversed bounds
    /// add nothing.
    pub fn insert_range(&mut self, start: usize, end: usize) {
        if start > end {
            return;
        }

        // First run that overlaps or touches the new one
        let lo = self
            .runs
            .partition_point(|&(_, e)| e.saturating_add(1) < start);
        let (mut start, mut end) = (start, end);
        let mut hi = lo;
        while hi < self.runs.len() && self.runs[hi].0 <= end.saturating_add(1) {
            start = start.min(self.runs[hi].0);
            end = end.max(self.runs[hi].1);
            hi += 1;
        }
        self.runs.splice(lo..hi, [(start, end)]);
    }

    pub fn contains(&self, page: usize) -> bool {
        let i = self.runs.partition_point(|&(_, e)| e < page);
        self.runs.get(i).is_some_and(|&(s, _)| s <= page)
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Number of pages in the set, saturating at `usize::MAX`.
    pub fn len(&self) -> usize {
        self.runs
            .iter()
            .fold(0usize, |n, &(s, e)| n.saturating_add((e - s).saturating_add(1)))
    }

    /// The maximal consecutive runs, in ascending order.
    pub fn runs(&self) -> impl Iterator<Item = RangeInclusive<usize>> + '_ {
        self.runs.iter().map(|&(s, e)| s..=e)
    }

    /// Every page in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.runs.iter().flat_map(|&(s, e)| s..=e)
    }
}

impl FromIterator<usize> for PageSet {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<usize> for PageSet {
    fn extend<T: IntoIterator<Item = usize>>(&mut self, iter: T) {
        for page in iter {
            self.insert(page);
        }
    }
}

/// The compact range syntax: `1-3, 5, 7-9`.
impl fmt::Display for PageSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, &(start, end)) in self.runs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if start == end {
                write!(f, "{}", start)?;
            } else {
                write!(f, "{}-{}", start, end)?;
            }
        }
        Ok(())
    }
}

/// Parses a page range string into a set of 1-based page numbers.
///
/// Segments are separated by `,` or the full-width `，`. A bare number
/// yields itself, `A-B` yields every page from `A` to `B` inclusive.
/// Reversed ranges (`B < A`) and numbers that do not fit in a `usize`
/// contribute nothing.
///
/// ```
/// use watermark_remover::domain::parse_page_range;
///
/// let pages = parse_page_range("1-3, 7");
/// assert_eq!(pages.iter().collect::<Vec<_>>(), vec![1, 2, 3, 7]);
/// ```
pub fn parse_page_range(input: &str) -> PageSet {
    let mut pages = PageSet::new();

    for segment in input.split([',', '，']) {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }

        let Some(caps) = segment_regex().captures(segment) else {
            continue;
        };

        let Ok(start) = caps[1].parse::<usize>() else {
            continue;
        };
        let end = match caps.get(2) {
            Some(m) => match m.as_str().parse::<usize>() {
                Ok(end) => end,
                Err(_) => continue,
            },
            None => start,
        };

        pages.insert_range(start, end);
    }

    pages
}

/// Formats a set of page numbers back into the compact range syntax.
///
/// Consecutive runs collapse into `A-B`, singletons stay bare, and the
/// tokens are joined with `", "`.
pub fn format_page_range(pages: &PageSet) -> String {
    pages.to_string()
}

/// Set of 1-based page numbers exempted from region removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludedPages {
    pages: PageSet,
}

impl ExcludedPages {
    /// Creates an empty exclusion set.
    pub fn none() -> Self {
        Self::default()
    }

    /// Parses a user supplied range string.
    pub fn parse(input: &str) -> Self {
        Self {
            pages: parse_page_range(input),
        }
    }

    /// Returns true if the 1-based page number is excluded.
    pub fn contains(&self, page_number: usize) -> bool {
        self.pages.contains(page_number)
    }

    /// Returns true if the 0-based page index is excluded.
    pub fn excludes_index(&self, page_index: usize) -> bool {
        page_index
            .checked_add(1)
            .is_some_and(|number| self.contains(number))
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// The normalized range string for display.
    pub fn to_range_string(&self) -> String {
        format_page_range(&self.pages)
    }

    pub fn pages(&self) -> &PageSet {
        &self.pages
    }
}

impl FromIterator<usize> for ExcludedPages {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        Self {
            pages: iter.into_iter().collect(),
        }
    }
}
