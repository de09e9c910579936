//! Field descriptors and the descriptor resolver.
//!
//! A [`FieldDescriptor`] names one data member of a record type together with
//! its [`FieldKind`] and its ordinal. Descriptor tables are `'static` and are
//! normally generated by `#[derive(Record)]` / `#[derive(FromRow)]`, so the kind
//! of every field is decided once at compile time rather than per cell.
//!
//! The ordinal is the only link between a column position and the field it
//! holds: the writer emits fields in ordinal order and the reader zips cells
//! with fields by ordinal.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SheetError};
use crate::traits::{FromRow, Record};

/// Semantic category of a field, used to pick the cell codec branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Text, written verbatim.
    String,
    /// 8 to 32 bit integers.
    Integer,
    /// 64 bit and wider integers.
    Long,
    /// Floating point numbers.
    Double,
    /// Date-times, written as `yyyy-MM-dd HH:mm:ss`.
    Date,
    /// Sequences of records, flattened into adjacent cells.
    Collection,
    /// Any other value: a nested record.
    Nested,
}

impl FieldKind {
    /// Returns `true` for the kinds written through their natural string form.
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            FieldKind::String | FieldKind::Integer | FieldKind::Long | FieldKind::Double
        )
    }

    /// Lowercase name of the kind, as accepted by `#[sheet(kind = "...")]`.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Long => "long",
            FieldKind::Double => "double",
            FieldKind::Date => "date",
            FieldKind::Collection => "collection",
            FieldKind::Nested => "nested",
        }
    }
}

/// Metadata describing one data member of a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    /// Field name, as used in property paths.
    pub name: &'static str,
    /// Declared semantic category.
    pub kind: FieldKind,
    /// Zero-based declaration order within the type.
    pub ordinal: usize,
}

impl FieldDescriptor {
    /// Creates a descriptor. Usable in `const` tables.
    pub const fn new(name: &'static str, kind: FieldKind, ordinal: usize) -> Self {
        FieldDescriptor {
            name,
            kind,
            ordinal,
        }
    }
}

/// Resolves the ordered field descriptors of a record instance's type.
///
/// Fails with [`SheetError::TypeIntrospection`] when the type's table is empty,
/// has ordinals out of declaration order, or repeats a field name.
pub fn resolve_fields(record: &dyn Record) -> Result<&'static [FieldDescriptor]> {
    let table = record.fields();
    validate_table(record.type_name(), table)?;
    Ok(table)
}

/// Resolves the ordered field descriptors of a row target type.
pub fn resolve_row_fields<T: FromRow>() -> Result<&'static [FieldDescriptor]> {
    let table = T::row_fields();
    validate_table(T::row_type_name(), table)?;
    Ok(table)
}

/// Looks up a single field by name on a record.
pub fn find_field(record: &dyn Record, name: &str) -> Option<&'static FieldDescriptor> {
    record.fields().iter().find(|field| field.name == name)
}

fn validate_table(type_name: &'static str, table: &[FieldDescriptor]) -> Result<()> {
    if table.is_empty() {
        return Err(SheetError::introspection(type_name, "no fields declared"));
    }

    let mut seen = HashSet::with_capacity(table.len());
    for (position, field) in table.iter().enumerate() {
        if field.ordinal != position {
            return Err(SheetError::introspection(
                type_name,
                format!(
                    "field `{}` has ordinal {} but is declared at position {}",
                    field.name, field.ordinal, position
                ),
            ));
        }
        if !seen.insert(field.name) {
            return Err(SheetError::introspection(
                type_name,
                format!("field `{}` is declared more than once", field.name),
            ));
        }
    }

    Ok(())
}
