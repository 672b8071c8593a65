use std::fmt;

use thiserror::Error;

use crate::reconcile::column_mapping::CanonicalField;

/// Reasons an upload cannot be turned into a canonical table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconcileError {
    #[error("upload is not valid comma-delimited text: {0}")]
    ParseFailure(String),

    #[error("upload does not contain any data rows")]
    EmptyTable,

    #[error("no column could be mapped to the required `ingredient` field")]
    MissingRequiredField,
}

/// Why a single canonical row could not become an [`Ingredient`](crate::ingredient::Ingredient).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("column `{field}` is not present in the recipe")]
    MissingColumn { field: CanonicalField },

    #[error("`{field}` is empty")]
    EmptyValue { field: CanonicalField },

    #[error("`{field}` value {value:?} is not a number")]
    NotANumber { field: CanonicalField, value: String },

    #[error("`{field}` value {value} must be finite and non-negative")]
    OutOfRange { field: CanonicalField, value: f64 },
}

/// A row that was skipped during conversion, with enough context to report it.
#[derive(Debug, Clone, PartialEq)]
pub struct RowDiagnostic {
    /// 1-based position among the data rows.
    pub row: usize,
    pub ingredient: Option<String>,
    pub error: RowError,
}

impl fmt::Display for RowDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ingredient {
            Some(name) => write!(f, "row {} ({}): {}", self.row, name, self.error),
            None => write!(f, "row {}: {}", self.row, self.error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PreferenceError {
    #[error("portion multiplier {value} is outside the supported range {min}..={max}")]
    PortionOutOfRange { value: f64, min: f64, max: f64 },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error while flushing CSV: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV output was not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
