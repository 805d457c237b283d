//! Regions, scopes and text targets collected from the user.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RemoverError, RemoverResult};

/// Smallest width or height, in page units, accepted for a drawn region.
pub const MIN_REGION_SIZE: f32 = 5.0;

/// Axis-aligned rectangle in PDF page coordinates.
///
/// Deserialized rectangles are normalized like [`Rect::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RectCorners")]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

/// Serialized form of a [`Rect`]: two corners in any order.
#[derive(Deserialize)]
struct RectCorners {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
}

impl From<RectCorners> for Rect {
    fn from(c: RectCorners) -> Self {
        Self::new(c.x0, c.y0, c.x1, c.y1)
    }
}

impl Rect {
    /// Builds a rectangle from two corners in any order.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.1}, {:.1}, {:.1}, {:.1})",
            self.x0, self.y0, self.x1, self.y1
        )
    }
}

/// How far a drawn region is reapplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Only the page the region was drawn on.
    #[default]
    Current,
    /// Every page of the file the region was drawn on.
    #[serde(alias = "all_pages")]
    AllPagesOfFile,
    /// Every page of every file in the batch.
    AllFiles,
    /// A scope value this version does not know. Resolves like `Current`.
    #[serde(other)]
    Unrecognized,
}

impl Scope {
    /// Human readable label used in previews and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Scope::Current | Scope::Unrecognized => "current page",
            Scope::AllPagesOfFile => "all pages of this file",
            Scope::AllFiles => "all pages of all files",
        }
    }
}

impl FromStr for Scope {
    type Err = RemoverError;

    fn from_str(s: &str) -> RemoverResult<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "current" | "page" => Ok(Scope::Current),
            "all-pages" | "file" => Ok(Scope::AllPagesOfFile),
            "all-files" | "all" => Ok(Scope::AllFiles),
            other => Err(RemoverError::invalid_input(
                "scope",
                format!(
                    "unknown scope '{}', expected current, all-pages or all-files",
                    other
                ),
            )),
        }
    }
}

/// Whether marked areas are left transparent or painted white.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMode {
    /// Content is removed and the area shows the page background.
    #[default]
    Transparent,
    /// Content is removed and the area is painted opaque white.
    OpaqueWhite,
}

impl FromStr for FillMode {
    type Err = RemoverError;

    fn from_str(s: &str) -> RemoverResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transparent" | "actual" | "none" => Ok(FillMode::Transparent),
            "white" | "opaque-white" | "cover" => Ok(FillMode::OpaqueWhite),
            other => Err(RemoverError::invalid_input(
                "fill",
                format!("unknown fill mode '{}', expected transparent or white", other),
            )),
        }
    }
}

/// A rectangle drawn by the user on one page of one file.
///
/// `rect` and `page` are expressed in the page space of the file at
/// `file_index`. Wider scopes reuse the rectangle unchanged on other
/// pages and files, even when their page sizes differ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub rect: Rect,
    /// 0-based page the region was drawn on.
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub scope: Scope,
    /// Index into the batch file list.
    #[serde(default)]
    pub file_index: usize,
}

impl Region {
    pub fn new(rect: Rect, page: usize, scope: Scope, file_index: usize) -> Self {
        Self {
            rect,
            page,
            scope,
            file_index,
        }
    }

    /// Rejects regions too small to have been drawn on purpose.
    pub fn validate(&self) -> RemoverResult<()> {
        if self.rect.width() < MIN_REGION_SIZE || self.rect.height() < MIN_REGION_SIZE {
            return Err(RemoverError::invalid_input(
                "region",
                format!(
                    "rectangle {} is smaller than {} units",
                    self.rect, MIN_REGION_SIZE
                ),
            ));
        }
        Ok(())
    }
}

/// Parses `PAGE:X0,Y0,X1,Y1[:SCOPE[:FILE]]`.
impl FromStr for Region {
    type Err = RemoverError;

    fn from_str(s: &str) -> RemoverResult<Self> {
        let invalid = |reason: String| RemoverError::invalid_input("region", reason);
        let parts: Vec<&str> = s.trim().split(':').collect();
        if !(2..=4).contains(&parts.len()) {
            return Err(invalid(format!(
                "'{}' is not PAGE:X0,Y0,X1,Y1[:SCOPE[:FILE]]",
                s
            )));
        }

        let page = parts[0]
            .trim()
            .parse::<usize>()
            .map_err(|_| invalid(format!("page '{}' is not a number", parts[0])))?;

        let coords = parts[1]
            .split(',')
            .map(|c| c.trim().parse::<f32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid(format!("rectangle '{}' has a non-numeric value", parts[1])))?;
        let [x0, y0, x1, y1] = coords[..] else {
            return Err(invalid(format!(
                "rectangle '{}' needs exactly four values",
                parts[1]
            )));
        };

        let scope = match parts.get(2) {
            Some(scope) => scope.parse()?,
            None => Scope::Current,
        };

        let file_index = match parts.get(3) {
            Some(index) => index
                .trim()
                .parse::<usize>()
                .map_err(|_| invalid(format!("file index '{}' is not a number", index)))?,
            None => 0,
        };

        let region = Region::new(Rect::new(x0, y0, x1, y1), page, scope, file_index);
        region.validate()?;
        Ok(region)
    }
}

/// A literal string removed wherever it occurs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextTarget(String);

impl TextTarget {
    /// Trims the input; blank input yields `None`.
    pub fn new(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TextTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Collects text targets from raw input rows.
///
/// Blank rows are skipped and repeated literals are kept once, in first
/// seen order.
pub fn collect_text_targets<I, S>(rows: I) -> Vec<TextTarget>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut targets: Vec<TextTarget> = Vec::new();
    for row in rows {
        if let Some(target) = TextTarget::new(row.as_ref()) {
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
    }
    targets
}
