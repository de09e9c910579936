//! Traits for derive macro support.
//!
//! [`Record`] is the write side: it exposes a type's field table and the
//! runtime value of each field. [`FromRow`] is the read side: it rebuilds a
//! value from the cells of one sheet row. Both are implemented by
//! `#[derive(Record)]` and `#[derive(FromRow)]`, and can also be written by hand.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

use crate::codec::{value_text, DATE_FORMAT};
use crate::error::Result;
use crate::field::FieldDescriptor;
use crate::reader::RowSlots;
use crate::value::FieldValue;

/// Types whose fields can be written into sheet cells.
///
/// # Derive Usage
///
/// ```
/// use sheetmap::Record;
///
/// #[derive(Record)]
/// struct Person {
///     name: String,
///     age: u32,
/// }
///
/// let person = Person { name: "Ann".into(), age: 30 };
/// let fields = person.fields();
/// assert_eq!(fields[0].name, "name");
/// assert_eq!(fields[1].ordinal, 1);
/// ```
///
/// # Manual Implementation
///
/// ```
/// use sheetmap::{FieldDescriptor, FieldKind, FieldValue, Record};
///
/// struct Person {
///     name: String,
///     age: u32,
/// }
///
/// impl Record for Person {
///     fn type_name(&self) -> &'static str {
///         "Person"
///     }
///
///     fn fields(&self) -> &'static [FieldDescriptor] {
///         const FIELDS: &[FieldDescriptor] = &[
///             FieldDescriptor::new("name", FieldKind::String, 0),
///             FieldDescriptor::new("age", FieldKind::Integer, 1),
///         ];
///         FIELDS
///     }
///
///     fn field_value(&self, name: &str) -> Option<FieldValue<'_>> {
///         match name {
///             "name" => Some(FieldValue::text(&self.name)),
///             "age" => Some(FieldValue::display(&self.age)),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Record {
    /// Name of the concrete type, for diagnostics.
    fn type_name(&self) -> &'static str;

    /// Field descriptors in declaration order.
    fn fields(&self) -> &'static [FieldDescriptor];

    /// Returns the value of a field, or `None` if the type has no such field.
    fn field_value(&self, name: &str) -> Option<FieldValue<'_>>;

    /// Text used when the whole record lands in a single cell.
    ///
    /// The default renders `TypeName(field=value, ...)`.
    fn cell_text(&self) -> String {
        let parts: Vec<String> = self
            .fields()
            .iter()
            .map(|field| {
                let text = match self.field_value(field.name) {
                    Some(FieldValue::Null) => "None".to_string(),
                    Some(value) => value_text(&value),
                    None => String::new(),
                };
                format!("{}={}", field.name, text)
            })
            .collect();
        format!("{}({})", self.type_name(), parts.join(", "))
    }
}

impl<T: Record + ?Sized> Record for &T {
    fn type_name(&self) -> &'static str {
        (**self).type_name()
    }

    fn fields(&self) -> &'static [FieldDescriptor] {
        (**self).fields()
    }

    fn field_value(&self, name: &str) -> Option<FieldValue<'_>> {
        (**self).field_value(name)
    }

    fn cell_text(&self) -> String {
        (**self).cell_text()
    }
}

impl<T: Record + ?Sized> Record for Box<T> {
    fn type_name(&self) -> &'static str {
        (**self).type_name()
    }

    fn fields(&self) -> &'static [FieldDescriptor] {
        (**self).fields()
    }

    fn field_value(&self, name: &str) -> Option<FieldValue<'_>> {
        (**self).field_value(name)
    }

    fn cell_text(&self) -> String {
        (**self).cell_text()
    }
}

/// Types that can be rebuilt from one sheet row.
///
/// Implemented by `#[derive(FromRow)]`. The reader fills a [`RowSlots`]
/// arena by ordinal and calls [`FromRow::from_slots`], which takes each slot
/// back out through [`FromCell`].
pub trait FromRow: Sized {
    /// Name of the type, for diagnostics.
    fn row_type_name() -> &'static str;

    /// Field descriptors in declaration order.
    fn row_fields() -> &'static [FieldDescriptor];

    /// Builds the value from the slots of one row.
    fn from_slots(slots: &mut RowSlots) -> Result<Self>;
}

/// Conversion from decoded cell text into a field value.
///
/// Cell text is whatever the decoder produced: trimmed text, integer-formatted
/// numbers, `TRUE`/`FALSE`, or the empty string for blank and absent cells.
pub trait FromCell: Sized {
    /// Parses the decoded cell text.
    fn from_cell(text: &str) -> std::result::Result<Self, String>;
}

impl FromCell for String {
    fn from_cell(text: &str) -> std::result::Result<Self, String> {
        Ok(text.to_string())
    }
}

impl<T: FromCell> FromCell for Option<T> {
    fn from_cell(text: &str) -> std::result::Result<Self, String> {
        if text.is_empty() {
            Ok(None)
        } else {
            T::from_cell(text).map(Some)
        }
    }
}

macro_rules! from_cell_parse {
    ($expected:literal => $($ty:ty),+) => {
        $(
            impl FromCell for $ty {
                fn from_cell(text: &str) -> std::result::Result<Self, String> {
                    if text.is_empty() {
                        return Err(format!("expected {}, found an empty cell", $expected));
                    }
                    text.trim()
                        .parse::<$ty>()
                        .map_err(|_| format!("expected {}, found `{}`", $expected, text))
                }
            }
        )+
    };
}

from_cell_parse!("an integer" => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
from_cell_parse!("a number" => f32, f64);

impl FromCell for bool {
    fn from_cell(text: &str) -> std::result::Result<Self, String> {
        if text.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if text.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(format!("expected TRUE or FALSE, found `{text}`"))
        }
    }
}

impl FromCell for char {
    fn from_cell(text: &str) -> std::result::Result<Self, String> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(format!("expected a single character, found `{text}`")),
        }
    }
}

impl FromCell for NaiveDateTime {
    fn from_cell(text: &str) -> std::result::Result<Self, String> {
        NaiveDateTime::parse_from_str(text, DATE_FORMAT)
            .map_err(|e| format!("expected a `{DATE_FORMAT}` date, found `{text}`: {e}"))
    }
}

impl FromCell for NaiveDate {
    fn from_cell(text: &str) -> std::result::Result<Self, String> {
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .or_else(|_| NaiveDateTime::from_cell(text).map(|dt| dt.date()))
            .map_err(|_| format!("expected a date, found `{text}`"))
    }
}

/// Conversion of date-like field types into the value the date codec formats.
pub trait AsDateTime {
    /// Returns the wall-clock date-time to write.
    fn as_date_time(&self) -> NaiveDateTime;
}

impl AsDateTime for NaiveDateTime {
    fn as_date_time(&self) -> NaiveDateTime {
        *self
    }
}

impl AsDateTime for NaiveDate {
    fn as_date_time(&self) -> NaiveDateTime {
        self.and_time(NaiveTime::MIN)
    }
}

impl<Tz: TimeZone> AsDateTime for DateTime<Tz> {
    fn as_date_time(&self) -> NaiveDateTime {
        self.naive_local()
    }
}
