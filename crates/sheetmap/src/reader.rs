//! Sheet reader.
//!
//! Rows are matched to fields purely by position: cell `i` of a row feeds the
//! field with ordinal `i`. Row 0 is the header row and is skipped by
//! [`read_rows`]; [`read_header`] reads only that row.
//!
//! Every cell is decoded to text first (see [`crate::codec::decode`]) and then
//! converted into the field's type through [`FromCell`]. Missing cells decode
//! to the empty string, which `Option` fields read as `None`.

use log::{debug, error, trace};

use crate::codec::decode_cell;
use crate::error::{Result, SheetError};
use crate::field::{resolve_row_fields, FieldDescriptor};
use crate::sink::Source;
use crate::traits::{FromCell, FromRow};

/// Decoded cell texts of one row, indexed by field ordinal.
///
/// Each slot can be taken once; [`FromRow::from_slots`] moves every value out
/// into the field it belongs to.
#[derive(Debug)]
pub struct RowSlots {
    type_name: &'static str,
    fields: &'static [FieldDescriptor],
    values: Vec<Option<String>>,
    row: usize,
}

impl RowSlots {
    /// Creates slots for `fields`, with one decoded text per field.
    ///
    /// `row` is the zero-based sheet row the texts came from.
    pub fn new(
        type_name: &'static str,
        fields: &'static [FieldDescriptor],
        values: Vec<String>,
        row: usize,
    ) -> Self {
        let mut values: Vec<Option<String>> = values.into_iter().map(Some).collect();
        values.resize(fields.len(), Some(String::new()));
        RowSlots {
            type_name,
            fields,
            values,
            row,
        }
    }

    /// One-based row number, as shown by spreadsheet applications.
    pub fn row_number(&self) -> usize {
        self.row + 1
    }

    /// Takes the slot at `ordinal` and converts it into `T`.
    pub fn take<T: FromCell>(&mut self, ordinal: usize) -> Result<T> {
        let field = self
            .fields
            .get(ordinal)
            .map_or("<unknown>", |field| field.name);

        let text = self
            .values
            .get_mut(ordinal)
            .and_then(Option::take)
            .ok_or_else(|| self.construction(field, "value missing or already taken"))?;

        T::from_cell(&text).map_err(|reason| self.construction(field, reason))
    }

    /// Decoded text of the named field, if its slot has not been taken.
    pub fn get(&self, name: &str) -> Option<&str> {
        let ordinal = self.fields.iter().position(|field| field.name == name)?;
        self.values.get(ordinal)?.as_deref()
    }

    /// Iterates fields together with their untaken texts.
    pub fn iter(&self) -> impl Iterator<Item = (&'static FieldDescriptor, Option<&str>)> + '_ {
        self.fields
            .iter()
            .zip(self.values.iter().map(Option::as_deref))
    }

    fn construction(&self, field: &'static str, reason: impl Into<String>) -> SheetError {
        SheetError::Construction {
            type_name: self.type_name,
            row: self.row_number(),
            field,
            reason: reason.into(),
        }
    }
}

/// Reads every data row of `source` into `T`, skipping the header row.
///
/// Absent rows and rows whose cells all decode empty are skipped. A row with
/// any non-blank cell is kept, even when that cell lies past the last field.
/// Cells past the last field are otherwise ignored; missing trailing cells
/// read as empty. The first row that fails to convert aborts the read.
pub fn read_rows<T: FromRow, S: Source + ?Sized>(source: &S) -> Result<Vec<T>> {
    let fields = resolve_row_fields::<T>()?;
    let mut records = Vec::new();

    for index in 1..source.row_count() {
        let Some(row) = source.row(index) else {
            trace!("row {index} is absent, skipped");
            continue;
        };
        if is_blank_row(source, &row) {
            trace!("row {index} is blank, skipped");
            continue;
        }

        let texts = decode_row(source, fields, &row);
        let mut slots = RowSlots::new(T::row_type_name(), fields, texts, index);
        records.push(T::from_slots(&mut slots)?);
    }

    debug!(
        "read {} `{}` rows",
        records.len(),
        T::row_type_name()
    );
    Ok(records)
}

/// Reads only the header row of `source` into `T`.
///
/// Returns `None` when row 0 is absent or blank.
pub fn read_header<T: FromRow, S: Source + ?Sized>(source: &S) -> Result<Option<T>> {
    let fields = resolve_row_fields::<T>()?;
    let Some(row) = source.row(0) else {
        return Ok(None);
    };
    if is_blank_row(source, &row) {
        return Ok(None);
    }
    let texts = decode_row(source, fields, &row);
    let mut slots = RowSlots::new(T::row_type_name(), fields, texts, 0);
    T::from_slots(&mut slots).map(Some)
}

/// Reads every data row and closes the source.
///
/// The source is closed whether or not the read succeeds; a close failure is
/// logged and does not replace the read result.
pub fn import<T: FromRow, S: Source>(mut source: S) -> Result<Vec<T>> {
    debug!("importing `{}` rows", T::row_type_name());
    let records = read_rows::<T, S>(&source);
    if let Err(err) = source.close() {
        error!("failed to close source: {err}");
    }
    records
}

fn decode_row<S: Source + ?Sized>(
    source: &S,
    fields: &[FieldDescriptor],
    row: &S::Row,
) -> Vec<String> {
    fields
        .iter()
        .map(|field| decode_cell(source, source.cell(row, field.ordinal).as_ref()))
        .collect()
}

/// A row is blank when every cell it holds decodes to empty text.
fn is_blank_row<S: Source + ?Sized>(source: &S, row: &S::Row) -> bool {
    (0..source.cell_count(row)).all(|index| {
        source
            .cell(row, index)
            .map_or(true, |cell| decode_cell(source, Some(&cell)).is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;
    use crate::memory::MemorySheet;
    use crate::sink::CellValue;

    #[derive(Debug, PartialEq)]
    struct Person {
        name: String,
        age: Option<u32>,
    }

    impl FromRow for Person {
        fn row_type_name() -> &'static str {
            "Person"
        }

        fn row_fields() -> &'static [FieldDescriptor] {
            const FIELDS: &[FieldDescriptor] = &[
                FieldDescriptor::new("name", FieldKind::String, 0),
                FieldDescriptor::new("age", FieldKind::Integer, 1),
            ];
            FIELDS
        }

        fn from_slots(slots: &mut RowSlots) -> Result<Self> {
            Ok(Person {
                name: slots.take(0)?,
                age: slots.take(1)?,
            })
        }
    }

    #[derive(Debug)]
    struct Strict {
        #[allow(dead_code)]
        count: i64,
    }

    impl FromRow for Strict {
        fn row_type_name() -> &'static str {
            "Strict"
        }

        fn row_fields() -> &'static [FieldDescriptor] {
            const FIELDS: &[FieldDescriptor] = &[FieldDescriptor::new("count", FieldKind::Long, 0)];
            FIELDS
        }

        fn from_slots(slots: &mut RowSlots) -> Result<Self> {
            Ok(Strict {
                count: slots.take(0)?,
            })
        }
    }

    fn person(name: &str, age: Option<u32>) -> Person {
        Person {
            name: name.to_string(),
            age,
        }
    }

    #[test]
    fn skips_header_and_blank_rows() {
        let mut sheet = MemorySheet::new("s");
        sheet.set_cell(0, 0, "Name");
        sheet.set_cell(0, 1, "Age");
        sheet.set_cell(1, 0, "Ann");
        sheet.set_cell(1, 1, 30.0);
        sheet.set_cell(2, 0, "   ");
        sheet.set_cell(4, 0, " Bo ");

        let people: Vec<Person> = read_rows(&sheet).unwrap();
        assert_eq!(people, vec![person("Ann", Some(30)), person("Bo", None)]);
    }

    #[test]
    fn header_row_reads_alone() {
        let sheet = MemorySheet::from_rows(
            "s",
            vec![
                vec![CellValue::from("Name"), CellValue::from(7.0)],
                vec![CellValue::from("Ann"), CellValue::from(30.0)],
            ],
        );
        let header: Option<Person> = read_header(&sheet).unwrap();
        assert_eq!(header, Some(person("Name", Some(7))));

        let empty: Option<Person> = read_header(&MemorySheet::new("e")).unwrap();
        assert_eq!(empty, None);

        let mut blank = MemorySheet::new("b");
        blank.set_cell(0, 0, " ");
        blank.set_cell(1, 0, "Ann");
        let blank: Option<Person> = read_header(&blank).unwrap();
        assert_eq!(blank, None);
    }

    #[test]
    fn extra_cells_are_ignored() {
        let sheet = MemorySheet::from_rows(
            "s",
            vec![
                vec![CellValue::from("h")],
                vec![
                    CellValue::from("Ann"),
                    CellValue::from(30.0),
                    CellValue::from("extra"),
                ],
            ],
        );
        let people: Vec<Person> = read_rows(&sheet).unwrap();
        assert_eq!(people, vec![person("Ann", Some(30))]);
    }

    #[test]
    fn unparsable_cell_reports_row() {
        let mut sheet = MemorySheet::new("s");
        sheet.set_cell(0, 0, "Count");
        sheet.set_cell(1, 0, 3.0);
        sheet.set_cell(2, 0, "three");

        let err = read_rows::<Strict, _>(&sheet).unwrap_err();
        match err {
            SheetError::Construction {
                type_name,
                row,
                field,
                reason,
            } => {
                assert_eq!(type_name, "Strict");
                assert_eq!(row, 3);
                assert_eq!(field, "count");
                assert!(reason.contains("`three`"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn row_with_data_past_last_field_is_kept() {
        let sheet = MemorySheet::from_rows(
            "s",
            vec![
                vec![CellValue::from("Name"), CellValue::from("Age")],
                vec![CellValue::Empty, CellValue::Empty, CellValue::from("data")],
                vec![CellValue::Empty, CellValue::from("  "), CellValue::Empty],
            ],
        );

        let people: Vec<Person> = read_rows(&sheet).unwrap();
        assert_eq!(people, vec![person("", None)]);
    }

    #[test]
    fn header_with_data_past_last_field_is_read() {
        let sheet = MemorySheet::from_rows(
            "s",
            vec![vec![CellValue::Empty, CellValue::Empty, CellValue::from("x")]],
        );
        let header: Option<Person> = read_header(&sheet).unwrap();
        assert_eq!(header, Some(person("", None)));
    }

    #[test]
    fn slots_take_once() {
        let mut slots = RowSlots::new(
            "Person",
            Person::row_fields(),
            vec!["Ann".to_string()],
            4,
        );
        assert_eq!(slots.get("age"), Some(""));
        assert_eq!(slots.take::<String>(0).unwrap(), "Ann");
        assert_eq!(slots.get("name"), None);

        let err = slots.take::<String>(0).unwrap_err();
        assert!(err.to_string().contains("row 5"));
        assert_eq!(slots.iter().count(), 2);
    }

    #[test]
    fn import_consumes_source() {
        let mut sheet = MemorySheet::new("s");
        sheet.set_cell(0, 0, "Name");
        sheet.set_cell(1, 0, "Ann");
        let people: Vec<Person> = import(&sheet).unwrap();
        assert_eq!(people, vec![person("Ann", None)]);
    }
}
