//! Implementation of the `#[derive(Record)]` and `#[derive(FromRow)]` macros.
//!
//! Both derives generate a `'static` field descriptor table from the struct
//! definition, so field kinds are decided once at compile time.

mod attrs;
mod derive;

pub use derive::{from_row_derive_impl, record_derive_impl};
