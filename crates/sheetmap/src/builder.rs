//! Row/sheet builder.
//!
//! The builder owns the row cursor of one export. It emits the title and
//! header rows, then one row per record, and hands every row to the sink as
//! soon as it is built. Nothing is buffered beyond the per-column widths.
//!
//! Layout depends only on whether a title is present:
//!
//! ```text
//! with title:     row 0 = merged title, row 1 = headers, data from row 2
//! without title:  row 0 = headers, data from row 1
//! ```
//!
//! [`SheetBuilder::finish`] commits the sheet. A builder dropped before that,
//! including one dropped by an error, discards the sheet instead, so a failed
//! export never leaves the sink open and never commits a partial sheet.

use log::{debug, error, trace, warn};

use crate::codec::{encode_path, encode_record, CellWriter, EncodedCell};
use crate::config::{ExportRequest, SheetLayout};
use crate::error::Result;
use crate::sink::{CellValue, MergeRegion, Sink, StyleToken};
use crate::traits::Record;

/// Outcome of a finished export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub sheet_name: String,
    /// Number of data rows written.
    pub data_rows: usize,
    /// Row index of the first data row.
    pub first_data_row: usize,
    /// Largest number of cells written to a single data row.
    pub widest_row: usize,
}

/// Streaming writer for one sheet.
///
/// ```
/// use sheetmap::{ExportRequest, MemoryBook, Record, SheetBuilder};
///
/// #[derive(Record)]
/// struct Person {
///     name: String,
///     age: u32,
/// }
///
/// let mut book = MemoryBook::new();
/// let request = ExportRequest::new("people", ["Name", "Age"]);
///
/// let mut builder = SheetBuilder::begin(&mut book, &request).unwrap();
/// builder.push(&Person { name: "Ann".into(), age: 30 }).unwrap();
/// let summary = builder.finish().unwrap();
///
/// assert_eq!(summary.data_rows, 1);
/// assert_eq!(book.sheet(0).unwrap().text(1, 1), Some("30"));
/// ```
pub struct SheetBuilder<S: Sink> {
    sink: S,
    sheet: Option<S::Sheet>,
    sheet_name: String,
    columns: Vec<String>,
    layout: SheetLayout,
    widths: Vec<u32>,
    first_data_row: usize,
    next_row: usize,
    widest_row: usize,
}

impl<S: Sink> SheetBuilder<S> {
    /// Creates the sheet and writes the title and header rows.
    pub fn begin(mut sink: S, request: &ExportRequest) -> Result<Self> {
        debug!(
            "exporting sheet `{}` with {} header columns",
            request.sheet_name,
            request.headers.len()
        );

        let sheet = sink.create_sheet(&request.sheet_name)?;
        let mut builder = SheetBuilder {
            sink,
            sheet: Some(sheet),
            sheet_name: request.sheet_name.clone(),
            columns: request.columns.clone(),
            layout: request.layout,
            widths: Vec::new(),
            first_data_row: request.first_data_row(),
            next_row: 0,
            widest_row: 0,
        };
        // On error the builder is dropped here, which discards the sheet.
        builder.write_heading(request)?;
        Ok(builder)
    }

    fn write_heading(&mut self, request: &ExportRequest) -> Result<()> {
        let Some(sheet) = self.sheet.as_ref() else {
            return Ok(());
        };

        if request.active_title().is_some() {
            let last_col = request.headers.len().saturating_sub(1);
            self.sink
                .add_merge_region(sheet, MergeRegion::new(0, 0, 0, last_col))?;
        }
        for region in &request.merge_regions {
            self.sink.add_merge_region(sheet, *region)?;
        }

        if let Some(title) = request.active_title() {
            let row = self.sink.create_row(sheet, self.next_row)?;
            let cell = self.sink.create_cell(&row, 0)?;
            self.sink.set_cell_style(&cell, StyleToken::Title)?;
            self.sink
                .set_cell_value(&cell, CellValue::Text(title.to_string()))?;
            self.next_row += 1;
        }

        let row = self.sink.create_row(sheet, self.next_row)?;
        for (index, header) in request.headers.iter().enumerate() {
            let cell = self.sink.create_cell(&row, index)?;
            self.sink.set_cell_style(&cell, StyleToken::Header)?;
            self.sink
                .set_cell_value(&cell, CellValue::Text(header.clone()))?;
            widen(&mut self.widths, &self.layout, index, header.len());
        }
        self.next_row += 1;

        Ok(())
    }

    /// Writes one record as the next data row.
    ///
    /// All fields are written in declaration order unless the request selected
    /// columns by property path. Collection fields widen the row.
    pub fn push(&mut self, record: &dyn Record) -> Result<()> {
        let Some(sheet) = self.sheet.as_ref() else {
            return Ok(());
        };

        let row = self.sink.create_row(sheet, self.next_row)?;
        let mut cursor = RowCursor {
            sink: &mut self.sink,
            row,
            column: 0,
            widths: &mut self.widths,
            layout: &self.layout,
        };

        if self.columns.is_empty() {
            encode_record(record, &mut cursor)?;
        } else {
            for path in &self.columns {
                encode_path(record, path, &mut cursor)?;
            }
        }

        trace!(
            "row {} of `{}`: {} cells",
            self.next_row,
            self.sheet_name,
            cursor.column
        );
        self.widest_row = self.widest_row.max(cursor.column);
        self.next_row += 1;
        Ok(())
    }

    /// Applies the tracked column widths and closes the sheet.
    ///
    /// A failure while closing is logged, not returned: the rows were already
    /// handed to the sink.
    pub fn finish(mut self) -> Result<ExportSummary> {
        if let Some(sheet) = self.sheet.as_ref() {
            for (col, units) in self.widths.iter().enumerate() {
                if *units > 0 {
                    self.sink.set_column_width(sheet, col, *units)?;
                }
            }
        }
        self.commit();

        let summary = ExportSummary {
            sheet_name: self.sheet_name.clone(),
            data_rows: self.next_row.saturating_sub(self.first_data_row),
            first_data_row: self.first_data_row,
            widest_row: self.widest_row,
        };
        debug!(
            "exported {} rows to sheet `{}`",
            summary.data_rows, summary.sheet_name
        );
        Ok(summary)
    }

    /// Current width of a column in 1/256ths of a character.
    pub fn column_width(&self, col: usize) -> u32 {
        self.widths.get(col).copied().unwrap_or(0)
    }

    fn commit(&mut self) {
        if let Some(sheet) = self.sheet.take() {
            if let Err(err) = self.sink.flush_and_close(sheet) {
                error!("failed to close sheet `{}`: {}", self.sheet_name, err);
            }
        }
    }

    fn discard(&mut self) {
        if let Some(sheet) = self.sheet.take() {
            warn!("export of sheet `{}` not finished, discarding", self.sheet_name);
            if let Err(err) = self.sink.discard(sheet) {
                error!("failed to discard sheet `{}`: {}", self.sheet_name, err);
            }
        }
    }
}

impl<S: Sink> Drop for SheetBuilder<S> {
    fn drop(&mut self) {
        self.discard();
    }
}

/// Widens a column to fit `len` bytes. Widths never shrink.
fn widen(widths: &mut Vec<u32>, layout: &SheetLayout, col: usize, len: usize) {
    if widths.len() <= col {
        widths.resize(col + 1, 0);
    }
    let width = layout.width_for(len);
    if width > widths[col] {
        widths[col] = width;
    }
}

struct RowCursor<'b, S: Sink> {
    sink: &'b mut S,
    row: S::Row,
    column: usize,
    widths: &'b mut Vec<u32>,
    layout: &'b SheetLayout,
}

impl<S: Sink> CellWriter for RowCursor<'_, S> {
    fn column(&self) -> usize {
        self.column
    }

    fn write(&mut self, cell: EncodedCell) -> Result<()> {
        let handle = self.sink.create_cell(&self.row, self.column)?;
        self.sink.set_cell_style(&handle, cell.style)?;
        widen(self.widths, self.layout, self.column, cell.text_len());
        if cell.value != CellValue::Empty {
            self.sink.set_cell_value(&handle, cell.value)?;
        }
        self.column += 1;
        Ok(())
    }
}

/// Exports `records` into a new sheet of `sink`.
///
/// The sheet is closed on every exit path. The first record that fails to
/// encode aborts the whole export and the sheet is discarded.
pub fn export<'r, S, R, I>(sink: S, request: &ExportRequest, records: I) -> Result<ExportSummary>
where
    S: Sink,
    R: Record + 'r,
    I: IntoIterator<Item = &'r R>,
{
    let mut builder = SheetBuilder::begin(sink, request)?;
    for record in records {
        builder.push(record)?;
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldDescriptor, FieldKind};
    use crate::memory::MemoryBook;
    use crate::value::FieldValue;

    struct Row {
        a: &'static str,
        b: i64,
    }

    impl Record for Row {
        fn type_name(&self) -> &'static str {
            "Row"
        }

        fn fields(&self) -> &'static [FieldDescriptor] {
            const FIELDS: &[FieldDescriptor] = &[
                FieldDescriptor::new("a", FieldKind::String, 0),
                FieldDescriptor::new("b", FieldKind::Long, 1),
            ];
            FIELDS
        }

        fn field_value(&self, name: &str) -> Option<FieldValue<'_>> {
            match name {
                "a" => Some(FieldValue::text(self.a)),
                "b" => Some(FieldValue::display(&self.b)),
                _ => None,
            }
        }
    }

    #[test]
    fn widen_only_grows() {
        let layout = SheetLayout {
            width_unit: 10,
            width_max: 100,
        };
        let mut widths = Vec::new();
        widen(&mut widths, &layout, 2, 4);
        assert_eq!(widths, vec![0, 0, 40]);
        widen(&mut widths, &layout, 2, 1);
        assert_eq!(widths, vec![0, 0, 40]);
        widen(&mut widths, &layout, 2, 30);
        assert_eq!(widths, vec![0, 0, 100]);
    }

    #[test]
    fn widths_track_longest_text() {
        let mut book = MemoryBook::new();
        let request = ExportRequest::new("s", ["A", "B"]);
        let rows = [
            Row { a: "abc", b: 1 },
            Row {
                a: "abcdefgh",
                b: 22,
            },
        ];
        export(&mut book, &request, &rows).unwrap();

        let sheet = book.sheet(0).unwrap();
        assert_eq!(sheet.column_width(0), Some(8 * 256));
        assert_eq!(sheet.column_width(1), Some(2 * 256));
    }

    #[test]
    fn builder_reports_summary() {
        let mut book = MemoryBook::new();
        let request = ExportRequest::new("s", ["A", "B"]).with_title("T");
        let mut builder = SheetBuilder::begin(&mut book, &request).unwrap();
        builder.push(&Row { a: "x", b: 1 }).unwrap();
        builder.push(&Row { a: "y", b: 2 }).unwrap();
        assert_eq!(builder.column_width(0), 256);
        let summary = builder.finish().unwrap();

        assert_eq!(
            summary,
            ExportSummary {
                sheet_name: "s".to_string(),
                data_rows: 2,
                first_data_row: 2,
                widest_row: 2,
            }
        );
        assert!(book.sheet(0).unwrap().is_closed());
    }

    #[test]
    fn dropped_builder_discards_sheet() {
        let mut book = MemoryBook::new();
        let request = ExportRequest::new("s", ["A"]);
        {
            let mut builder = SheetBuilder::begin(&mut book, &request).unwrap();
            builder.push(&Row { a: "x", b: 1 }).unwrap();
        }
        let sheet = book.sheet(0).unwrap();
        assert!(sheet.is_closed());
        assert!(sheet.is_discarded());
    }

    #[test]
    fn finished_builder_commits_sheet() {
        let mut book = MemoryBook::new();
        let request = ExportRequest::new("s", ["A"]);
        let builder = SheetBuilder::begin(&mut book, &request).unwrap();
        builder.finish().unwrap();

        let sheet = book.sheet(0).unwrap();
        assert!(sheet.is_closed());
        assert!(!sheet.is_discarded());
    }
}
