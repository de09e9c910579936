//! Derive macros for sheetmap.
//!
//! This crate generates the compile-time field descriptor tables that the
//! sheetmap engine walks when it writes records to a sheet and reads them back.
//!
//! # Available Macros
//!
//! - [`Record`] - Generate `sheetmap::Record` (write side)
//! - [`FromRow`] - Generate `sheetmap::FromRow` (read side)
//!
//! Both macros emit paths under `::sheetmap`, so they are meant to be used
//! through the re-exports in the `sheetmap` crate.

mod record;

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

/// Derives the `Record` trait for a struct with named fields.
///
/// Every field becomes one entry of the descriptor table, in declaration
/// order. The field kind is inferred from the declared type:
///
/// | Type | Kind |
/// |------|------|
/// | `String`, `&str`, `Cow<str>`, `bool`, `char` | `String` |
/// | `i8`, `i16`, `i32`, `u8`, `u16`, `u32` | `Integer` |
/// | `i64`, `u64`, `i128`, `u128`, `isize`, `usize` | `Long` |
/// | `f32`, `f64` | `Double` |
/// | `NaiveDateTime`, `NaiveDate`, `DateTime<Tz>` | `Date` |
/// | `Vec`, `VecDeque`, `HashSet`, `BTreeSet`, `LinkedList`, arrays, slices | `Collection` |
/// | anything else | `Nested` |
///
/// `Option<T>` takes the kind of `T` and writes `None` as an empty cell.
/// Collection elements and nested values must implement `Record` themselves.
///
/// # Field Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `skip` | Leave the field out of the table |
/// | `rename = "..."` | Name used in property paths |
/// | `kind = "..."` | Override the inferred kind |
/// | `display` | Write the value through `Display` as a string |
///
/// # Container Attributes
///
/// | Attribute | Description |
/// |-----------|-------------|
/// | `display` | Use the type's `Display` impl as its single-cell text |
///
/// # Example
///
/// ```ignore
/// use sheetmap::Record;
///
/// #[derive(Record)]
/// struct Order {
///     id: u64,
///     #[sheet(rename = "customer")]
///     customer_name: String,
///     #[sheet(skip)]
///     cache: Vec<u8>,
///     placed: Option<chrono::NaiveDateTime>,
/// }
/// ```
#[proc_macro_derive(Record, attributes(sheet))]
pub fn record_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::record_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derives the `FromRow` trait for a struct with named fields.
///
/// Cell `i` of a row is converted into the `i`-th non-skipped field through
/// `sheetmap::FromCell`. Skipped fields are filled with `Default::default()`.
/// The same `#[sheet(...)]` field attributes as [`Record`] apply.
///
/// # Example
///
/// ```ignore
/// use sheetmap::FromRow;
///
/// #[derive(FromRow)]
/// struct Person {
///     name: String,
///     age: Option<u32>,
/// }
/// ```
#[proc_macro_derive(FromRow, attributes(sheet))]
pub fn from_row_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::from_row_derive_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
