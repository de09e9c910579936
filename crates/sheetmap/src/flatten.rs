//! Collection flattening.
//!
//! A collection field widens its row: every element contributes one cell per
//! field, element after element, with no separator between groups. A
//! collection of N elements with M fields each adds N×M cells starting at the
//! column where the collection field was reached. Element groups are not
//! marked; readers that need them back must count fields per element.
//!
//! An empty collection adds nothing here. The codec writes one empty cell in
//! its place so the fields after it stay under their headers.

use crate::codec::{encode_field, CellWriter};
use crate::error::Result;
use crate::field::resolve_fields;
use crate::traits::Record;

/// Writes every field of every element into consecutive columns.
///
/// Returns the number of cells written. Collection fields inside an element
/// flatten recursively.
pub fn flatten(elements: &[&dyn Record], out: &mut dyn CellWriter) -> Result<usize> {
    let start = out.column();
    for element in elements {
        for field in resolve_fields(*element)? {
            encode_field(*element, field, field.name, out)?;
        }
    }
    Ok(out.column() - start)
}
