//! Error types for the sheetmap crate.

use thiserror::Error;

/// Errors that can occur while exporting records to a sheet or reading them back.
#[derive(Debug, Error)]
pub enum SheetError {
    /// The record type exposes no usable field metadata.
    #[error("type `{type_name}` has no usable field metadata: {reason}")]
    TypeIntrospection {
        type_name: &'static str,
        reason: String,
    },

    /// A segment of a dotted property path did not resolve.
    #[error("field `{segment}` not found on `{type_name}` while resolving `{path}`")]
    FieldNotFound {
        type_name: &'static str,
        path: String,
        segment: String,
    },

    /// A row's values could not be materialized into the target type.
    #[error("cannot build `{type_name}` from sheet row {row}: field `{field}`: {reason}")]
    Construction {
        type_name: &'static str,
        /// One-based sheet row number.
        row: usize,
        field: &'static str,
        reason: String,
    },

    /// The sink or source failed.
    #[error("sheet I/O error: {0}")]
    Resource(String),
}

impl SheetError {
    pub(crate) fn introspection(type_name: &'static str, reason: impl Into<String>) -> Self {
        SheetError::TypeIntrospection {
            type_name,
            reason: reason.into(),
        }
    }

    pub(crate) fn field_not_found(
        type_name: &'static str,
        path: &str,
        segment: &str,
    ) -> Self {
        SheetError::FieldNotFound {
            type_name,
            path: path.to_string(),
            segment: segment.to_string(),
        }
    }
}

impl From<std::io::Error> for SheetError {
    fn from(err: std::io::Error) -> Self {
        SheetError::Resource(err.to_string())
    }
}

#[cfg(feature = "xlsx")]
impl From<rust_xlsxwriter::XlsxError> for SheetError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        SheetError::Resource(format!("xlsx write error: {err}"))
    }
}

#[cfg(feature = "xlsx")]
impl From<calamine::XlsxError> for SheetError {
    fn from(err: calamine::XlsxError) -> Self {
        SheetError::Resource(format!("xlsx read error: {err}"))
    }
}

/// Result type for sheetmap operations.
pub type Result<T> = std::result::Result<T, SheetError>;
