use serde::Serialize;
use tracing::warn;

use crate::error::{RowDiagnostic, RowError};
use crate::reconcile::{CanonicalField, CanonicalRow, CanonicalTable};

/// One ingredient with its purchase, cooking and bulk amounts. Units are
/// carried as written and never converted.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Ingredient {
    pub name: String,
    pub essential_quantity: f64,
    pub essential_unit: String,
    pub cooking_quantity: f64,
    pub cooking_unit: String,
    pub bulk_quantity: f64,
    pub bulk_unit: String,
}

pub type RowOutcome = Result<Ingredient, RowDiagnostic>;

impl Ingredient {
    /// Converts a canonical row; `row` is the 1-based data row number used in diagnostics.
    pub fn from_canonical_row(row: usize, cells: &CanonicalRow) -> RowOutcome {
        let name = cells.ingredient.clone();
        let diagnostic = |error: RowError| RowDiagnostic {
            row,
            ingredient: if name.is_empty() { None } else { Some(name.clone()) },
            error,
        };

        if name.trim().is_empty() {
            return Err(diagnostic(RowError::EmptyValue { field: CanonicalField::Ingredient }));
        }

        Ok(Ingredient {
            essential_quantity: parse_quantity(cells, CanonicalField::EssentialQuantity).map_err(&diagnostic)?,
            essential_unit: unit(cells, CanonicalField::EssentialUnit).map_err(&diagnostic)?,
            cooking_quantity: parse_quantity(cells, CanonicalField::CookingQuantity).map_err(&diagnostic)?,
            cooking_unit: unit(cells, CanonicalField::CookingUnit).map_err(&diagnostic)?,
            bulk_quantity: parse_quantity(cells, CanonicalField::BulkQuantity).map_err(&diagnostic)?,
            bulk_unit: unit(cells, CanonicalField::BulkUnit).map_err(&diagnostic)?,
            name,
        })
    }
}

impl CanonicalTable {
    /// Converts every row, keeping failures as diagnostics in row order.
    pub fn ingredients(&self) -> Vec<RowOutcome> {
        self.rows
            .iter()
            .enumerate()
            .map(|(idx, cells)| {
                let outcome = Ingredient::from_canonical_row(idx + 1, cells);
                if let Err(diagnostic) = &outcome {
                    warn!("Skipping {}", diagnostic);
                }
                outcome
            })
            .collect()
    }
}

fn parse_quantity(cells: &CanonicalRow, field: CanonicalField) -> Result<f64, RowError> {
    let raw = cells.value(field).ok_or(RowError::MissingColumn { field })?.trim();
    if raw.is_empty() {
        return Err(RowError::EmptyValue { field });
    }
    let value: f64 = raw
        .parse()
        .map_err(|_| RowError::NotANumber { field, value: raw.to_string() })?;
    if !value.is_finite() || value < 0.0 {
        return Err(RowError::OutOfRange { field, value });
    }
    Ok(value)
}

fn unit(cells: &CanonicalRow, field: CanonicalField) -> Result<String, RowError> {
    cells
        .value(field)
        .map(str::to_string)
        .ok_or(RowError::MissingColumn { field })
}
