//! Export request and sheet layout options.
//!
//! Both types deserialize with defaults, so an export can be described in a
//! JSON or YAML document:
//!
//! ```
//! use sheetmap::ExportRequest;
//!
//! let request: ExportRequest = serde_json::from_str(
//!     r#"{ "sheet_name": "people", "headers": ["Name", "Age"], "title": "Staff" }"#,
//! ).unwrap();
//! assert_eq!(request.title.as_deref(), Some("Staff"));
//! assert!(request.merge_regions.is_empty());
//! ```

use serde::{Deserialize, Serialize};

use crate::sink::MergeRegion;

/// Default width unit: 1/256th of a character per encoded byte.
pub const DEFAULT_WIDTH_UNIT: u32 = 256;

/// Default maximum column width, 255 characters.
pub const DEFAULT_WIDTH_MAX: u32 = 255 * 256;

/// Column width heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetLayout {
    /// Width units per byte of encoded text.
    pub width_unit: u32,
    /// Upper bound for any column width.
    pub width_max: u32,
}

impl Default for SheetLayout {
    fn default() -> Self {
        SheetLayout {
            width_unit: DEFAULT_WIDTH_UNIT,
            width_max: DEFAULT_WIDTH_MAX,
        }
    }
}

impl SheetLayout {
    /// Width for a cell text of `len` bytes, clamped to the maximum.
    pub fn width_for(&self, len: usize) -> u32 {
        let len = u32::try_from(len).unwrap_or(u32::MAX);
        len.saturating_mul(self.width_unit).min(self.width_max)
    }
}

/// Describes one export: the sheet, its header row, and an optional title.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportRequest {
    /// Name of the sheet to create.
    pub sheet_name: String,
    /// Header texts, one per column.
    pub headers: Vec<String>,
    /// Title placed in a merged row above the headers.
    pub title: Option<String>,
    /// Additional merge regions, added with the title merge.
    pub merge_regions: Vec<MergeRegion>,
    /// Dotted property paths selecting the exported columns. Empty exports
    /// every field in declaration order.
    pub columns: Vec<String>,
    /// Column width heuristic.
    pub layout: SheetLayout,
}

impl ExportRequest {
    /// Creates a request for `sheet_name` with the given header row.
    pub fn new<I, H>(sheet_name: impl Into<String>, headers: I) -> Self
    where
        I: IntoIterator<Item = H>,
        H: Into<String>,
    {
        ExportRequest {
            sheet_name: sheet_name.into(),
            headers: headers.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Adds a title row spanning the header columns.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Adds a merge region.
    pub fn with_merge(mut self, region: MergeRegion) -> Self {
        self.merge_regions.push(region);
        self
    }

    /// Selects the exported columns by dotted property path.
    pub fn with_columns<I, P>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the column width heuristic.
    pub fn with_layout(mut self, layout: SheetLayout) -> Self {
        self.layout = layout;
        self
    }

    /// The title, if present and non-empty.
    pub fn active_title(&self) -> Option<&str> {
        self.title.as_deref().filter(|title| !title.is_empty())
    }

    /// Row index of the first data row: 2 with a title, 1 without.
    pub fn first_data_row(&self) -> usize {
        if self.active_title().is_some() {
            2
        } else {
            1
        }
    }
}
