//! Collaborator contracts: where rows go and where they come from.
//!
//! The engine never touches a file format. It drives a [`Sink`] that accepts
//! ordered rows of styled cells, and reads from a [`Source`] that yields rows
//! of typed cell values. Handles are associated types so each collaborator
//! picks its own addressing.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Value written into one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// No content.
    Empty,
    /// Text content.
    Text(String),
    /// Numeric content.
    Number(f64),
    /// Boolean content.
    Boolean(bool),
}

impl CellValue {
    /// Returns the text content, if this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Native kind of this value as a source would report it.
    pub fn kind(&self) -> CellKind {
        match self {
            CellValue::Empty => CellKind::Blank,
            CellValue::Text(_) => CellKind::Text,
            CellValue::Number(_) => CellKind::Numeric,
            CellValue::Boolean(_) => CellKind::Boolean,
        }
    }
}

impl From<&str> for CellValue {
    fn from(text: &str) -> Self {
        CellValue::Text(text.to_string())
    }
}

impl From<String> for CellValue {
    fn from(text: String) -> Self {
        CellValue::Text(text)
    }
}

impl From<f64> for CellValue {
    fn from(number: f64) -> Self {
        CellValue::Number(number)
    }
}

impl From<bool> for CellValue {
    fn from(flag: bool) -> Self {
        CellValue::Boolean(flag)
    }
}

/// Runtime content type of a cell read from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Blank,
    Numeric,
    Boolean,
    Text,
}

/// Logical cell style. The sink decides what each token looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StyleToken {
    Header,
    Title,
    Data,
    DataEmphasized,
}

/// Rectangular cell range to merge, all bounds inclusive and zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MergeRegion {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

impl MergeRegion {
    pub fn new(row_start: usize, row_end: usize, col_start: usize, col_end: usize) -> Self {
        MergeRegion {
            row_start,
            row_end,
            col_start,
            col_end,
        }
    }

    /// Returns `true` if the region covers exactly one cell.
    pub fn is_single_cell(&self) -> bool {
        self.row_start == self.row_end && self.col_start == self.col_end
    }
}

/// Destination that accepts ordered rows of cells.
///
/// Calls arrive in row order; a row is never revisited once the next row has
/// been created, so implementations may stream.
pub trait Sink {
    type Sheet;
    type Row;
    type Cell;

    fn create_sheet(&mut self, name: &str) -> Result<Self::Sheet>;

    fn create_row(&mut self, sheet: &Self::Sheet, index: usize) -> Result<Self::Row>;

    fn create_cell(&mut self, row: &Self::Row, index: usize) -> Result<Self::Cell>;

    fn set_cell_style(&mut self, cell: &Self::Cell, style: StyleToken) -> Result<()>;

    fn set_cell_value(&mut self, cell: &Self::Cell, value: CellValue) -> Result<()>;

    /// Sets a column width in 1/256ths of a character.
    fn set_column_width(&mut self, sheet: &Self::Sheet, col: usize, units: u32) -> Result<()>;

    fn add_merge_region(&mut self, sheet: &Self::Sheet, region: MergeRegion) -> Result<()>;

    /// Flushes buffered output and releases the sheet.
    fn flush_and_close(&mut self, sheet: Self::Sheet) -> Result<()>;

    /// Releases the sheet after a failed export without committing it.
    fn discard(&mut self, sheet: Self::Sheet) -> Result<()>;
}

impl<S: Sink + ?Sized> Sink for &mut S {
    type Sheet = S::Sheet;
    type Row = S::Row;
    type Cell = S::Cell;

    fn create_sheet(&mut self, name: &str) -> Result<Self::Sheet> {
        (**self).create_sheet(name)
    }

    fn create_row(&mut self, sheet: &Self::Sheet, index: usize) -> Result<Self::Row> {
        (**self).create_row(sheet, index)
    }

    fn create_cell(&mut self, row: &Self::Row, index: usize) -> Result<Self::Cell> {
        (**self).create_cell(row, index)
    }

    fn set_cell_style(&mut self, cell: &Self::Cell, style: StyleToken) -> Result<()> {
        (**self).set_cell_style(cell, style)
    }

    fn set_cell_value(&mut self, cell: &Self::Cell, value: CellValue) -> Result<()> {
        (**self).set_cell_value(cell, value)
    }

    fn set_column_width(&mut self, sheet: &Self::Sheet, col: usize, units: u32) -> Result<()> {
        (**self).set_column_width(sheet, col, units)
    }

    fn add_merge_region(&mut self, sheet: &Self::Sheet, region: MergeRegion) -> Result<()> {
        (**self).add_merge_region(sheet, region)
    }

    fn flush_and_close(&mut self, sheet: Self::Sheet) -> Result<()> {
        (**self).flush_and_close(sheet)
    }

    fn discard(&mut self, sheet: Self::Sheet) -> Result<()> {
        (**self).discard(sheet)
    }
}

/// Origin of rows of typed cells, addressed by zero-based row and column.
pub trait Source {
    type Row;
    type Cell;

    /// Number of rows, including the header row.
    fn row_count(&self) -> usize;

    /// Returns the row at `index`, or `None` if the row is absent.
    fn row(&self, index: usize) -> Option<Self::Row>;

    /// Number of cell positions in `row` (one past the last cell).
    fn cell_count(&self, row: &Self::Row) -> usize;

    /// Returns the cell at `index`, or `None` if the cell is absent.
    fn cell(&self, row: &Self::Row, index: usize) -> Option<Self::Cell>;

    fn cell_kind(&self, cell: &Self::Cell) -> CellKind;

    fn cell_text(&self, cell: &Self::Cell) -> String;

    fn cell_number(&self, cell: &Self::Cell) -> f64;

    fn cell_bool(&self, cell: &Self::Cell) -> bool;

    /// Releases the underlying resource.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: Source + ?Sized> Source for &S {
    type Row = S::Row;
    type Cell = S::Cell;

    fn row_count(&self) -> usize {
        (**self).row_count()
    }

    fn row(&self, index: usize) -> Option<Self::Row> {
        (**self).row(index)
    }

    fn cell_count(&self, row: &Self::Row) -> usize {
        (**self).cell_count(row)
    }

    fn cell(&self, row: &Self::Row, index: usize) -> Option<Self::Cell> {
        (**self).cell(row, index)
    }

    fn cell_kind(&self, cell: &Self::Cell) -> CellKind {
        (**self).cell_kind(cell)
    }

    fn cell_text(&self, cell: &Self::Cell) -> String {
        (**self).cell_text(cell)
    }

    fn cell_number(&self, cell: &Self::Cell) -> f64 {
        (**self).cell_number(cell)
    }

    fn cell_bool(&self, cell: &Self::Cell) -> bool {
        (**self).cell_bool(cell)
    }
}
