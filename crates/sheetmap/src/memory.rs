//! In-memory grid collaborator.
//!
//! [`MemoryBook`] is a [`Sink`] that keeps every sheet as a sparse grid of
//! styled cells; each [`MemorySheet`] is also a [`Source`], so an export can be
//! read straight back without a file format in between.

use std::collections::BTreeMap;

use crate::error::{Result, SheetError};
use crate::sink::{CellKind, CellValue, MergeRegion, Sink, Source, StyleToken};

/// One stored cell.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryCell {
    pub value: CellValue,
    pub style: Option<StyleToken>,
}

impl Default for MemoryCell {
    fn default() -> Self {
        MemoryCell {
            value: CellValue::Empty,
            style: None,
        }
    }
}

/// A sparse sheet of cells addressed by zero-based row and column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySheet {
    name: String,
    rows: BTreeMap<usize, BTreeMap<usize, MemoryCell>>,
    widths: BTreeMap<usize, u32>,
    merges: Vec<MergeRegion>,
    closed: bool,
    discarded: bool,
}

impl MemorySheet {
    /// Creates an empty sheet.
    pub fn new(name: impl Into<String>) -> Self {
        MemorySheet {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Creates a sheet with one row per entry of `rows`, starting at row 0.
    pub fn from_rows<R>(name: impl Into<String>, rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = CellValue>,
    {
        let mut sheet = MemorySheet::new(name);
        for (row_index, row) in rows.into_iter().enumerate() {
            let cells = sheet.rows.entry(row_index).or_default();
            for (col, value) in row.into_iter().enumerate() {
                cells.insert(col, MemoryCell { value, style: None });
            }
        }
        sheet
    }

    /// Stores a value, creating the row and cell as needed.
    pub fn set_cell(&mut self, row: usize, col: usize, value: impl Into<CellValue>) {
        self.rows
            .entry(row)
            .or_default()
            .entry(col)
            .or_default()
            .value = value.into();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Returns `true` if the sheet was released by a failed export.
    ///
    /// The cells written before the failure are kept for inspection.
    pub fn is_discarded(&self) -> bool {
        self.discarded
    }

    pub fn cell_at(&self, row: usize, col: usize) -> Option<&MemoryCell> {
        self.rows.get(&row).and_then(|cells| cells.get(&col))
    }

    pub fn value(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.cell_at(row, col).map(|cell| &cell.value)
    }

    /// Text of a cell, if the cell exists and holds text.
    pub fn text(&self, row: usize, col: usize) -> Option<&str> {
        self.value(row, col).and_then(CellValue::as_text)
    }

    pub fn style(&self, row: usize, col: usize) -> Option<StyleToken> {
        self.cell_at(row, col).and_then(|cell| cell.style)
    }

    /// Texts of a row up to its last cell; non-text and missing cells are `""`.
    pub fn row_texts(&self, row: usize) -> Vec<&str> {
        let Some(cells) = self.rows.get(&row) else {
            return Vec::new();
        };
        let width = cells.keys().next_back().map_or(0, |last| last + 1);
        (0..width)
            .map(|col| {
                cells
                    .get(&col)
                    .and_then(|cell| cell.value.as_text())
                    .unwrap_or("")
            })
            .collect()
    }

    pub fn column_width(&self, col: usize) -> Option<u32> {
        self.widths.get(&col).copied()
    }

    pub fn merge_regions(&self) -> &[MergeRegion] {
        &self.merges
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(SheetError::Resource(format!(
                "sheet `{}` is already closed",
                self.name
            )))
        } else {
            Ok(())
        }
    }
}

/// A collection of in-memory sheets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryBook {
    sheets: Vec<MemorySheet>,
}

impl MemoryBook {
    pub fn new() -> Self {
        MemoryBook::default()
    }

    pub fn sheet(&self, index: usize) -> Option<&MemorySheet> {
        self.sheets.get(index)
    }

    pub fn sheet_by_name(&self, name: &str) -> Option<&MemorySheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    pub fn sheets(&self) -> &[MemorySheet] {
        &self.sheets
    }

    fn sheet_mut(&mut self, index: usize) -> Result<&mut MemorySheet> {
        let sheet = self
            .sheets
            .get_mut(index)
            .ok_or_else(|| SheetError::Resource(format!("no sheet at index {index}")))?;
        sheet.ensure_open()?;
        Ok(sheet)
    }

    fn cell_mut(&mut self, (sheet, row, col): (usize, usize, usize)) -> Result<&mut MemoryCell> {
        self.sheet_mut(sheet)?
            .rows
            .get_mut(&row)
            .and_then(|cells| cells.get_mut(&col))
            .ok_or_else(|| SheetError::Resource(format!("no cell at ({row}, {col})")))
    }
}

impl Sink for MemoryBook {
    type Sheet = usize;
    type Row = (usize, usize);
    type Cell = (usize, usize, usize);

    fn create_sheet(&mut self, name: &str) -> Result<usize> {
        self.sheets.push(MemorySheet::new(name));
        Ok(self.sheets.len() - 1)
    }

    fn create_row(&mut self, sheet: &usize, index: usize) -> Result<(usize, usize)> {
        self.sheet_mut(*sheet)?.rows.entry(index).or_default();
        Ok((*sheet, index))
    }

    fn create_cell(&mut self, row: &(usize, usize), index: usize) -> Result<(usize, usize, usize)> {
        let (sheet, row) = *row;
        self.sheet_mut(sheet)?
            .rows
            .entry(row)
            .or_default()
            .insert(index, MemoryCell::default());
        Ok((sheet, row, index))
    }

    fn set_cell_style(&mut self, cell: &(usize, usize, usize), style: StyleToken) -> Result<()> {
        self.cell_mut(*cell)?.style = Some(style);
        Ok(())
    }

    fn set_cell_value(&mut self, cell: &(usize, usize, usize), value: CellValue) -> Result<()> {
        self.cell_mut(*cell)?.value = value;
        Ok(())
    }

    fn set_column_width(&mut self, sheet: &usize, col: usize, units: u32) -> Result<()> {
        self.sheet_mut(*sheet)?.widths.insert(col, units);
        Ok(())
    }

    fn add_merge_region(&mut self, sheet: &usize, region: MergeRegion) -> Result<()> {
        self.sheet_mut(*sheet)?.merges.push(region);
        Ok(())
    }

    fn flush_and_close(&mut self, sheet: usize) -> Result<()> {
        self.sheet_mut(sheet)?.closed = true;
        Ok(())
    }

    fn discard(&mut self, sheet: usize) -> Result<()> {
        let sheet = self.sheet_mut(sheet)?;
        sheet.closed = true;
        sheet.discarded = true;
        Ok(())
    }
}

impl Source for MemorySheet {
    type Row = usize;
    type Cell = (usize, usize);

    fn row_count(&self) -> usize {
        self.rows.keys().next_back().map_or(0, |last| last + 1)
    }

    fn row(&self, index: usize) -> Option<usize> {
        self.rows.contains_key(&index).then_some(index)
    }

    fn cell_count(&self, row: &usize) -> usize {
        self.rows
            .get(row)
            .and_then(|cells| cells.keys().next_back())
            .map_or(0, |last| last + 1)
    }

    fn cell(&self, row: &usize, index: usize) -> Option<(usize, usize)> {
        self.cell_at(*row, index).map(|_| (*row, index))
    }

    fn cell_kind(&self, cell: &(usize, usize)) -> CellKind {
        self.value(cell.0, cell.1)
            .map_or(CellKind::Blank, CellValue::kind)
    }

    fn cell_text(&self, cell: &(usize, usize)) -> String {
        self.text(cell.0, cell.1).unwrap_or_default().to_string()
    }

    fn cell_number(&self, cell: &(usize, usize)) -> f64 {
        match self.value(cell.0, cell.1) {
            Some(CellValue::Number(number)) => *number,
            _ => 0.0,
        }
    }

    fn cell_bool(&self, cell: &(usize, usize)) -> bool {
        matches!(self.value(cell.0, cell.1), Some(CellValue::Boolean(true)))
    }
}
