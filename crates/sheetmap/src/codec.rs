//! Type-directed cell codec.
//!
//! Encoding dispatches on the field's declared [`FieldKind`], in this order:
//!
//! | Kind | Cell |
//! |------|------|
//! | `String`, `Integer`, `Long`, `Double` | natural string form, verbatim |
//! | `Date` | `yyyy-MM-dd HH:mm:ss` |
//! | `Collection` | handed to the [flattener](crate::flatten), one cell per element field; an empty collection still takes one empty cell |
//! | anything else, no dot left in the path | the value's [`Record::cell_text`] |
//! | anything else, dot left in the path | descend one level and dispatch again |
//!
//! A scalar field ends the walk even when the path goes on: `"title.len"`
//! writes the `title` text. [`resolve_path`](crate::resolve_path) rejects the
//! same path with [`SheetError::FieldNotFound`].
//!
//! Decoding ignores the target field entirely and dispatches on the cell's own
//! content type. Absent cells decode to the empty string; a truncated row
//! therefore reads as blank fields rather than failing.

use log::trace;

use crate::error::{Result, SheetError};
use crate::field::{resolve_fields, FieldDescriptor, FieldKind};
use crate::flatten::flatten;
use crate::path::{lookup_field, split_head};
use crate::sink::{CellKind, CellValue, Source, StyleToken};
use crate::traits::Record;
use crate::value::FieldValue;

/// chrono pattern equivalent to `yyyy-MM-dd HH:mm:ss`.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Substring that switches a data cell to [`StyleToken::DataEmphasized`].
///
/// Detection is a plain substring search; every occurrence is removed from the
/// written text.
pub const EMPHASIS_MARKER: &str = "bold";

/// One encoded cell: the value to write and the style to write it with.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedCell {
    pub value: CellValue,
    pub style: StyleToken,
}

impl EncodedCell {
    /// Encodes a data text, applying the emphasis marker.
    pub fn text(raw: &str) -> Self {
        if raw.contains(EMPHASIS_MARKER) {
            EncodedCell {
                value: CellValue::Text(raw.replace(EMPHASIS_MARKER, "")),
                style: StyleToken::DataEmphasized,
            }
        } else {
            EncodedCell {
                value: CellValue::Text(raw.to_string()),
                style: StyleToken::Data,
            }
        }
    }

    /// An empty data cell, written for absent values.
    pub fn empty() -> Self {
        EncodedCell {
            value: CellValue::Empty,
            style: StyleToken::Data,
        }
    }

    /// Byte length of the written text, used for column width tracking.
    pub fn text_len(&self) -> usize {
        match &self.value {
            CellValue::Text(text) => text.len(),
            _ => 0,
        }
    }
}

/// Receiver of encoded cells, one column at a time.
pub trait CellWriter {
    /// Column the next cell will be written to.
    fn column(&self) -> usize;

    /// Writes a cell at [`CellWriter::column`] and advances the cursor by one.
    fn write(&mut self, cell: EncodedCell) -> Result<()>;
}

impl CellWriter for Vec<EncodedCell> {
    fn column(&self) -> usize {
        self.len()
    }

    fn write(&mut self, cell: EncodedCell) -> Result<()> {
        self.push(cell);
        Ok(())
    }
}

/// Encodes every field of `record` in ordinal order.
pub fn encode_record(record: &dyn Record, out: &mut dyn CellWriter) -> Result<()> {
    for field in resolve_fields(record)? {
        encode_field(record, field, field.name, out)?;
    }
    Ok(())
}

/// Encodes the field selected by a dotted property path on `record`.
pub fn encode_path(record: &dyn Record, path: &str, out: &mut dyn CellWriter) -> Result<()> {
    let (head, _) = split_head(path);
    let field = lookup_field(record, path, head)?;
    encode_field(record, field, path, out)
}

/// Encodes one field of `owner`.
///
/// `path` is the active property path, starting with `field`'s own name. A
/// remaining dot makes a nested value descend instead of rendering as text.
pub fn encode_field(
    owner: &dyn Record,
    field: &FieldDescriptor,
    path: &str,
    out: &mut dyn CellWriter,
) -> Result<()> {
    let value = owner
        .field_value(field.name)
        .ok_or_else(|| SheetError::field_not_found(owner.type_name(), path, field.name))?;

    match (field.kind, value) {
        (_, FieldValue::Null) => out.write(EncodedCell::empty()),
        (kind, FieldValue::Text(text)) if kind.is_scalar() => out.write(EncodedCell::text(&text)),
        (FieldKind::Date, FieldValue::Date(date)) => {
            out.write(EncodedCell::text(&date.format(DATE_FORMAT).to_string()))
        }
        (FieldKind::Collection, FieldValue::Collection(elements)) if elements.is_empty() => {
            out.write(EncodedCell::empty())
        }
        (FieldKind::Collection, FieldValue::Collection(elements)) => {
            flatten(&elements, out).map(|_| ())
        }
        (_, value) => match split_head(path).1 {
            Some(rest) => descend(owner, value, path, rest, out),
            None => out.write(EncodedCell::text(&value_text(&value))),
        },
    }
}

fn descend(
    owner: &dyn Record,
    value: FieldValue<'_>,
    path: &str,
    rest: &str,
    out: &mut dyn CellWriter,
) -> Result<()> {
    let (head, _) = split_head(rest);
    let Some(nested) = value.as_nested() else {
        return Err(SheetError::field_not_found(owner.type_name(), path, head));
    };
    let field = lookup_field(nested, path, head)?;
    encode_field(nested, field, rest, out)
}

pub(crate) fn value_text(value: &FieldValue<'_>) -> String {
    match value {
        FieldValue::Null => String::new(),
        FieldValue::Text(text) => text.to_string(),
        FieldValue::Date(date) => date.format(DATE_FORMAT).to_string(),
        FieldValue::Collection(elements) => {
            let items: Vec<String> = elements.iter().map(|e| e.cell_text()).collect();
            format!("[{}]", items.join(", "))
        }
        FieldValue::Nested(record) => record.cell_text(),
    }
}

/// Decodes a cell value into the text handed to [`crate::FromCell`].
///
/// - blank: empty string
/// - numeric: integer-formatted, fraction rounded away
/// - boolean: `TRUE` / `FALSE`
/// - text: trimmed
pub fn decode(value: &CellValue) -> String {
    match value {
        CellValue::Empty => String::new(),
        CellValue::Number(number) => format_integer(*number),
        CellValue::Boolean(true) => "TRUE".to_string(),
        CellValue::Boolean(false) => "FALSE".to_string(),
        CellValue::Text(text) => text.trim().to_string(),
    }
}

/// Decodes a source cell. An absent cell decodes to the empty string.
pub fn decode_cell<S: Source + ?Sized>(source: &S, cell: Option<&S::Cell>) -> String {
    let Some(cell) = cell else {
        trace!("absent cell decoded as empty text");
        return String::new();
    };

    let value = match source.cell_kind(cell) {
        CellKind::Blank => CellValue::Empty,
        CellKind::Numeric => CellValue::Number(source.cell_number(cell)),
        CellKind::Boolean => CellValue::Boolean(source.cell_bool(cell)),
        CellKind::Text => CellValue::Text(source.cell_text(cell)),
    };
    decode(&value)
}

/// Formats a number with no fractional digits, rounding half to even.
///
/// Fractions are dropped: a numeric cell holding `2.5` reads back as
/// `"2"`.
pub fn format_integer(number: f64) -> String {
    format!("{:.0}", number.round_ties_even())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    struct Tag {
        label: String,
        weight: i32,
    }

    impl Record for Tag {
        fn type_name(&self) -> &'static str {
            "Tag"
        }

        fn fields(&self) -> &'static [FieldDescriptor] {
            const FIELDS: &[FieldDescriptor] = &[
                FieldDescriptor::new("label", FieldKind::String, 0),
                FieldDescriptor::new("weight", FieldKind::Integer, 1),
            ];
            FIELDS
        }

        fn field_value(&self, name: &str) -> Option<FieldValue<'_>> {
            match name {
                "label" => Some(FieldValue::text(&self.label)),
                "weight" => Some(FieldValue::display(&self.weight)),
                _ => None,
            }
        }
    }

    struct Entry {
        title: String,
        created: Option<chrono::NaiveDateTime>,
        main_tag: Tag,
        tags: Vec<Tag>,
    }

    impl Record for Entry {
        fn type_name(&self) -> &'static str {
            "Entry"
        }

        fn fields(&self) -> &'static [FieldDescriptor] {
            const FIELDS: &[FieldDescriptor] = &[
                FieldDescriptor::new("title", FieldKind::String, 0),
                FieldDescriptor::new("created", FieldKind::Date, 1),
                FieldDescriptor::new("main_tag", FieldKind::Nested, 2),
                FieldDescriptor::new("tags", FieldKind::Collection, 3),
            ];
            FIELDS
        }

        fn field_value(&self, name: &str) -> Option<FieldValue<'_>> {
            match name {
                "title" => Some(FieldValue::text(&self.title)),
                "created" => Some(match self.created {
                    Some(date) => FieldValue::Date(date),
                    None => FieldValue::Null,
                }),
                "main_tag" => Some(FieldValue::Nested(&self.main_tag)),
                "tags" => Some(FieldValue::Collection(
                    self.tags.iter().map(|t| t as &dyn Record).collect(),
                )),
                _ => None,
            }
        }
    }

    fn tag(label: &str, weight: i32) -> Tag {
        Tag {
            label: label.to_string(),
            weight,
        }
    }

    fn entry() -> Entry {
        Entry {
            title: "first".to_string(),
            created: NaiveDate::from_ymd_opt(2020, 3, 19)
                .and_then(|d| d.and_hms_opt(17, 1, 24)),
            main_tag: tag("m", 9),
            tags: vec![tag("x", 1), tag("y", 2)],
        }
    }

    fn texts(cells: &[EncodedCell]) -> Vec<String> {
        cells
            .iter()
            .map(|c| c.value.as_text().unwrap_or("").to_string())
            .collect()
    }

    #[test]
    fn marker_switches_style_and_is_stripped() {
        let cell = EncodedCell::text("overdue bold");
        assert_eq!(cell.value, CellValue::Text("overdue ".to_string()));
        assert_eq!(cell.style, StyleToken::DataEmphasized);

        let cell = EncodedCell::text("plain");
        assert_eq!(cell.value, CellValue::Text("plain".to_string()));
        assert_eq!(cell.style, StyleToken::Data);
    }

    #[test]
    fn marker_removes_every_occurrence() {
        let cell = EncodedCell::text("boldXbold");
        assert_eq!(cell.value.as_text(), Some("X"));
    }

    #[test]
    fn record_encodes_in_ordinal_order() {
        let mut cells = Vec::new();
        encode_record(&entry(), &mut cells).unwrap();
        assert_eq!(
            texts(&cells),
            vec![
                "first",
                "2020-03-19 17:01:24",
                "Tag(label=m, weight=9)",
                "x",
                "1",
                "y",
                "2"
            ]
        );
    }

    #[test]
    fn null_field_writes_empty_cell() {
        let mut record = entry();
        record.created = None;
        let mut cells = Vec::new();
        encode_record(&record, &mut cells).unwrap();
        assert_eq!(cells[1], EncodedCell::empty());
        assert_eq!(cells.len(), 7);
    }

    #[test]
    fn dotted_path_descends_into_nested() {
        let mut cells = Vec::new();
        encode_path(&entry(), "main_tag.weight", &mut cells).unwrap();
        assert_eq!(texts(&cells), vec!["9"]);
    }

    #[test]
    fn dotted_path_stops_at_scalar() {
        let mut cells = Vec::new();
        encode_path(&entry(), "title.len", &mut cells).unwrap();
        assert_eq!(texts(&cells), vec!["first"]);
    }

    #[test]
    fn empty_collection_keeps_its_column() {
        let mut record = entry();
        record.tags.clear();
        let mut cells = Vec::new();
        encode_record(&record, &mut cells).unwrap();
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[3], EncodedCell::empty());
    }

    #[test]
    fn unknown_path_head_fails() {
        let mut cells = Vec::new();
        let err = encode_path(&entry(), "missing", &mut cells).unwrap_err();
        assert!(err.to_string().contains("`missing`"));
    }

    #[test]
    fn decode_by_cell_kind() {
        assert_eq!(decode(&CellValue::Empty), "");
        assert_eq!(decode(&CellValue::Number(30.0)), "30");
        assert_eq!(decode(&CellValue::Boolean(true)), "TRUE");
        assert_eq!(decode(&CellValue::Boolean(false)), "FALSE");
        assert_eq!(decode(&CellValue::Text("  Ann ".to_string())), "Ann");
    }

    #[test]
    fn integer_formatting_drops_fractions() {
        assert_eq!(format_integer(41.0), "41");
        assert_eq!(format_integer(2.5), "2");
        assert_eq!(format_integer(3.5), "4");
        assert_eq!(format_integer(7.2), "7");
        assert_eq!(format_integer(-7.8), "-8");
        assert_eq!(format_integer(1e15), "1000000000000000");
    }
}
