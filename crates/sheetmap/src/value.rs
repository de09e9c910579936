//! Runtime field values.
//!
//! [`FieldValue`] is what a [`Record`] hands to the codec for one field. It is
//! borrowed from the record wherever possible; nested records and collection
//! elements are exposed as trait objects so the codec can recurse into them
//! without knowing their concrete types.

use std::borrow::Cow;
use std::fmt;

use chrono::NaiveDateTime;

use crate::traits::Record;

/// Runtime value of a record field.
pub enum FieldValue<'a> {
    /// Absent value (`None`). Written as an empty, styled cell.
    Null,
    /// Natural string form of a string or numeric field.
    Text(Cow<'a, str>),
    /// Date-time value.
    Date(NaiveDateTime),
    /// Elements of a collection field, in iteration order.
    Collection(Vec<&'a dyn Record>),
    /// A nested record.
    Nested(&'a dyn Record),
}

impl<'a> FieldValue<'a> {
    /// Borrowed text value.
    pub fn text(value: &'a str) -> Self {
        FieldValue::Text(Cow::Borrowed(value))
    }

    /// Owned text value from anything displayable.
    pub fn display(value: &impl fmt::Display) -> Self {
        FieldValue::Text(Cow::Owned(value.to_string()))
    }

    /// Returns `true` if this is a `Null` value.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Extracts the text value, if present.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Extracts the nested record, if present.
    pub fn as_nested(&self) -> Option<&'a dyn Record> {
        match self {
            FieldValue::Nested(record) => Some(*record),
            _ => None,
        }
    }
}

impl fmt::Debug for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("Null"),
            FieldValue::Text(text) => f.debug_tuple("Text").field(text).finish(),
            FieldValue::Date(date) => f.debug_tuple("Date").field(date).finish(),
            FieldValue::Collection(elements) => f
                .debug_tuple("Collection")
                .field(&elements.len())
                .finish(),
            FieldValue::Nested(record) => {
                f.debug_tuple("Nested").field(&record.type_name()).finish()
            }
        }
    }
}
