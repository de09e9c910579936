//! `.xlsx` file collaborators.
//!
//! [`XlsxSink`] writes through `rust_xlsxwriter` and saves the workbook when
//! the sheet is closed. A discarded sheet is never saved, so a failed export
//! leaves no file behind. [`XlsxSource`] loads the first worksheet of a file with
//! `calamine` into an in-memory grid and reads from there.

use std::path::{Path, PathBuf};

use calamine::{open_workbook, Data, Reader, Xlsx};
use log::{debug, warn};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet};

use crate::builder::{export, ExportSummary};
use crate::config::ExportRequest;
use crate::error::{Result, SheetError};
use crate::memory::MemorySheet;
use crate::reader::{import, read_header};
use crate::sink::{CellKind, CellValue, MergeRegion, Sink, Source, StyleToken};
use crate::traits::{FromRow, Record};

/// Largest row index an xlsx worksheet accepts.
const MAX_ROW: u32 = 1_048_575;
/// Largest column index an xlsx worksheet accepts.
const MAX_COL: u16 = 16_383;

/// Cell formats for each style token.
#[derive(Debug, Clone)]
struct Formats {
    header: Format,
    title: Format,
    data: Format,
    emphasized: Format,
}

impl Default for Formats {
    fn default() -> Self {
        let data = Format::new().set_border(FormatBorder::Thin);
        Formats {
            header: Format::new()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_border(FormatBorder::Thin)
                .set_background_color(Color::Silver),
            title: Format::new()
                .set_bold()
                .set_font_size(16)
                .set_align(FormatAlign::Center),
            emphasized: data.clone().set_bold(),
            data,
        }
    }
}

impl Formats {
    fn get(&self, style: StyleToken) -> &Format {
        match style {
            StyleToken::Header => &self.header,
            StyleToken::Title => &self.title,
            StyleToken::Data => &self.data,
            StyleToken::DataEmphasized => &self.emphasized,
        }
    }
}

/// Sink writing a `.xlsx` workbook to `path`.
///
/// The file is written when a sheet is closed. Every sheet created before that
/// point ends up in the same file.
///
/// Only the style of the most recently styled cell is remembered; a value
/// written to any other cell takes the data format.
pub struct XlsxSink {
    workbook: Workbook,
    path: PathBuf,
    formats: Formats,
    last_style: Option<((usize, u32, u16), StyleToken)>,
    sheets: usize,
}

impl XlsxSink {
    /// Creates a sink that will save to `path`.
    pub fn create(path: impl Into<PathBuf>) -> Self {
        XlsxSink {
            workbook: Workbook::new(),
            path: path.into(),
            formats: Formats::default(),
            last_style: None,
            sheets: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn worksheet(&mut self, index: usize) -> Result<&mut Worksheet> {
        Ok(self.workbook.worksheet_from_index(index)?)
    }

    fn format_of(&self, cell: &(usize, u32, u16)) -> Format {
        let style = match self.last_style {
            Some((styled, style)) if styled == *cell => style,
            _ => StyleToken::Data,
        };
        self.formats.get(style).clone()
    }
}

impl Sink for XlsxSink {
    type Sheet = usize;
    type Row = (usize, u32);
    type Cell = (usize, u32, u16);

    fn create_sheet(&mut self, name: &str) -> Result<usize> {
        self.workbook.add_worksheet().set_name(name)?;
        self.sheets += 1;
        Ok(self.sheets - 1)
    }

    fn create_row(&mut self, sheet: &usize, index: usize) -> Result<(usize, u32)> {
        Ok((*sheet, cast_row_num(index)?))
    }

    fn create_cell(&mut self, row: &(usize, u32), index: usize) -> Result<(usize, u32, u16)> {
        Ok((row.0, row.1, cast_col_num(index)?))
    }

    fn set_cell_style(&mut self, cell: &(usize, u32, u16), style: StyleToken) -> Result<()> {
        self.last_style = Some((*cell, style));
        let format = self.formats.get(style).clone();
        let (sheet, row, col) = *cell;
        self.worksheet(sheet)?.write_blank(row, col, &format)?;
        Ok(())
    }

    fn set_cell_value(&mut self, cell: &(usize, u32, u16), value: CellValue) -> Result<()> {
        let format = self.format_of(cell);
        let (sheet, row, col) = *cell;
        let worksheet = self.worksheet(sheet)?;
        match value {
            CellValue::Empty => worksheet.write_blank(row, col, &format)?,
            CellValue::Text(text) => worksheet.write_string_with_format(row, col, &text, &format)?,
            CellValue::Number(number) => {
                worksheet.write_number_with_format(row, col, number, &format)?
            }
            CellValue::Boolean(flag) => {
                worksheet.write_boolean_with_format(row, col, flag, &format)?
            }
        };
        Ok(())
    }

    fn set_column_width(&mut self, sheet: &usize, col: usize, units: u32) -> Result<()> {
        let col = cast_col_num(col)?;
        self.worksheet(*sheet)?
            .set_column_width(col, f64::from(units) / 256.0)?;
        Ok(())
    }

    fn add_merge_region(&mut self, sheet: &usize, region: MergeRegion) -> Result<()> {
        if region.is_single_cell() {
            warn!("skipping single-cell merge region {region:?}");
            return Ok(());
        }
        let format = if region.row_start == 0 {
            self.formats.title.clone()
        } else {
            self.formats.data.clone()
        };
        self.worksheet(*sheet)?.merge_range(
            cast_row_num(region.row_start)?,
            cast_col_num(region.col_start)?,
            cast_row_num(region.row_end)?,
            cast_col_num(region.col_end)?,
            "",
            &format,
        )?;
        Ok(())
    }

    fn flush_and_close(&mut self, _sheet: usize) -> Result<()> {
        self.last_style = None;
        self.workbook.save(&self.path)?;
        debug!("saved workbook to {}", self.path.display());
        Ok(())
    }

    fn discard(&mut self, sheet: usize) -> Result<()> {
        self.last_style = None;
        debug!(
            "discarded sheet {sheet}, {} not written",
            self.path.display()
        );
        Ok(())
    }
}

/// Source reading the first worksheet of a `.xlsx` file.
///
/// The worksheet is loaded eagerly; rows without any used cell are absent.
#[derive(Debug, Clone)]
pub struct XlsxSource {
    grid: MemorySheet,
}

impl XlsxSource {
    /// Opens `path` and loads its first worksheet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut workbook: Xlsx<_> = open_workbook(path)?;
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| {
                SheetError::Resource(format!("{} has no worksheets", path.display()))
            })?;

        let range = workbook.worksheet_range(&sheet_name)?;
        let (row_start, col_start) = range.start().unwrap_or((0, 0));
        let mut grid = MemorySheet::new(sheet_name);

        // Range iterators yield positions relative to range.start().
        for (row, col, value) in range.used_cells() {
            let Some(value) = convert_value(value) else {
                continue;
            };
            grid.set_cell(row + row_start as usize, col + col_start as usize, value);
        }

        debug!(
            "loaded sheet `{}` from {} ({} rows)",
            grid.name(),
            path.display(),
            grid.row_count()
        );
        Ok(XlsxSource { grid })
    }

    pub fn sheet_name(&self) -> &str {
        self.grid.name()
    }
}

impl Source for XlsxSource {
    type Row = usize;
    type Cell = (usize, usize);

    fn row_count(&self) -> usize {
        self.grid.row_count()
    }

    fn row(&self, index: usize) -> Option<usize> {
        self.grid.row(index)
    }

    fn cell_count(&self, row: &usize) -> usize {
        self.grid.cell_count(row)
    }

    fn cell(&self, row: &usize, index: usize) -> Option<(usize, usize)> {
        self.grid.cell(row, index)
    }

    fn cell_kind(&self, cell: &(usize, usize)) -> CellKind {
        self.grid.cell_kind(cell)
    }

    fn cell_text(&self, cell: &(usize, usize)) -> String {
        self.grid.cell_text(cell)
    }

    fn cell_number(&self, cell: &(usize, usize)) -> f64 {
        self.grid.cell_number(cell)
    }

    fn cell_bool(&self, cell: &(usize, usize)) -> bool {
        self.grid.cell_bool(cell)
    }

    fn close(&mut self) -> Result<()> {
        debug!("closing sheet `{}`", self.grid.name());
        Ok(())
    }
}

fn convert_value(value: &Data) -> Option<CellValue> {
    match value {
        Data::Empty => None,
        Data::Bool(v) => Some(CellValue::Boolean(*v)),
        Data::Int(v) => Some(CellValue::Number(*v as f64)),
        Data::Float(v) => Some(CellValue::Number(*v)),
        Data::String(v) => Some(CellValue::Text(v.clone())),
        Data::Error(e) => Some(CellValue::Text(e.to_string())),
        Data::DateTime(v) => Some(CellValue::Number(v.as_f64())),
        Data::DateTimeIso(v) => Some(CellValue::Text(v.clone())),
        Data::DurationIso(v) => Some(CellValue::Text(v.clone())),
    }
}

fn cast_row_num(value: usize) -> Result<u32> {
    u32::try_from(value)
        .ok()
        .filter(|row| *row <= MAX_ROW)
        .ok_or_else(|| SheetError::Resource(format!("row index overflow: {value}")))
}

fn cast_col_num(value: usize) -> Result<u16> {
    u16::try_from(value)
        .ok()
        .filter(|col| *col <= MAX_COL)
        .ok_or_else(|| SheetError::Resource(format!("column index overflow: {value}")))
}

/// Exports `records` into a new `.xlsx` file at `path`.
pub fn export_xlsx<R: Record>(
    path: impl AsRef<Path>,
    request: &ExportRequest,
    records: &[R],
) -> Result<ExportSummary> {
    let mut sink = XlsxSink::create(path.as_ref());
    export(&mut sink, request, records)
}

/// Reads every data row of the first worksheet of `path`.
pub fn read_xlsx<T: FromRow>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    import(XlsxSource::open(path)?)
}

/// Reads only the header row of the first worksheet of `path`.
pub fn read_xlsx_header<T: FromRow>(path: impl AsRef<Path>) -> Result<Option<T>> {
    let mut source = XlsxSource::open(path)?;
    let header = read_header::<T, _>(&source);
    source.close()?;
    header
}
