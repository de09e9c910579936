//! Sheetmap - Marshal typed Rust records into spreadsheet rows and back.
//!
//! Sheetmap turns a sequence of records into a sheet: an optional merged title
//! row, a header row, and one data row per record. It reads such a sheet back
//! into a sequence of records by matching cell positions to field order. It
//! supports:
//!
//! - Type-directed cell encoding for strings, numbers, dates and nested records
//! - Collection fields flattened into adjacent cells
//! - Dotted property paths (`"address.city"`) selecting nested columns
//! - Column widths tracked from the longest text written
//! - Pluggable sinks and sources, with an in-memory grid and `.xlsx` files built in
//!
//! # Quick Start
//!
//! ```rust
//! use sheetmap::{export, read_rows, ExportRequest, FromRow, MemoryBook, Record};
//!
//! #[derive(Debug, PartialEq, Record, FromRow)]
//! struct Person {
//!     name: String,
//!     age: u32,
//! }
//!
//! let people = vec![
//!     Person { name: "Ann".into(), age: 30 },
//!     Person { name: "Bo".into(), age: 41 },
//! ];
//!
//! let mut book = MemoryBook::new();
//! let request = ExportRequest::new("people", ["Name", "Age"]).with_title("Staff");
//! let summary = export(&mut book, &request, &people).unwrap();
//! assert_eq!(summary.first_data_row, 2);
//!
//! let sheet = book.sheet(0).unwrap();
//! assert_eq!(sheet.row_texts(1), vec!["Name", "Age"]);
//! assert_eq!(sheet.row_texts(2), vec!["Ann", "30"]);
//! ```
//!
//! # Sheet Layout
//!
//! ```text
//! with title:     row 0 = title merged across the header columns
//!                 row 1 = headers
//!                 row 2.. = data
//! without title:  row 0 = headers
//!                 row 1.. = data
//! ```
//!
//! Reading always treats row 0 as the header row and skips it, so a titled
//! sheet reads its header row back as the first record.
//!
//! # Field Kinds
//!
//! | Kind | Rust types | Cell |
//! |------|------------|------|
//! | String | `String`, `&str`, `bool`, `char` | verbatim text |
//! | Integer | `i8`..`i32`, `u8`..`u32` | decimal text |
//! | Long | `i64`, `u64`, `i128`, `u128`, `isize`, `usize` | decimal text |
//! | Double | `f32`, `f64` | decimal text |
//! | Date | `NaiveDateTime`, `NaiveDate`, `DateTime<Tz>` | `yyyy-MM-dd HH:mm:ss` |
//! | Collection | `Vec`, `VecDeque`, sets, `LinkedList` | one cell per element field |
//! | Nested | anything else | the record's cell text |
//!
//! `Option<T>` takes the kind of `T`; `None` writes an empty, styled cell.

extern crate self as sheetmap;

mod builder;
mod codec;
mod config;
mod error;
mod field;
mod flatten;
mod memory;
mod path;
mod reader;
mod sink;
mod traits;
mod value;
#[cfg(feature = "xlsx")]
mod xlsx;

// Re-export public API
pub use builder::{export, ExportSummary, SheetBuilder};
pub use codec::{
    decode, decode_cell, encode_field, encode_path, encode_record, format_integer, CellWriter,
    EncodedCell, DATE_FORMAT, EMPHASIS_MARKER,
};
pub use config::{ExportRequest, SheetLayout, DEFAULT_WIDTH_MAX, DEFAULT_WIDTH_UNIT};
pub use error::{Result, SheetError};
pub use field::{find_field, resolve_fields, resolve_row_fields, FieldDescriptor, FieldKind};
pub use flatten::flatten;
pub use memory::{MemoryBook, MemoryCell, MemorySheet};
pub use path::{resolve_path, split_head};
pub use reader::{import, read_header, read_rows, RowSlots};
pub use sink::{CellKind, CellValue, MergeRegion, Sink, Source, StyleToken};
pub use traits::{AsDateTime, FromCell, FromRow, Record};
pub use value::FieldValue;
#[cfg(feature = "xlsx")]
pub use xlsx::{export_xlsx, read_xlsx, read_xlsx_header, XlsxSink, XlsxSource};

// Derive macros share their trait's name.
pub use sheetmap_macros::{FromRow, Record};
