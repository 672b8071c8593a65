use serde::Serialize;
use tracing::{debug, info};

use super::preferences::DietaryPreferences;
use crate::error::RowDiagnostic;
use crate::ingredient::Ingredient;
use crate::reconcile::CanonicalTable;

/// Scales `ingredient` by the portion multiplier, or returns `None` when the
/// preferences exclude it. Restrictions are not consulted.
pub fn adjust_quantities(ingredient: &Ingredient, preferences: &DietaryPreferences) -> Option<Ingredient> {
    if preferences.excludes(&ingredient.name) {
        return None;
    }

    let multiplier = preferences.portion_multiplier();
    Some(Ingredient {
        name: ingredient.name.clone(),
        essential_quantity: ingredient.essential_quantity * multiplier,
        essential_unit: ingredient.essential_unit.clone(),
        cooking_quantity: ingredient.cooking_quantity * multiplier,
        cooking_unit: ingredient.cooking_unit.clone(),
        bulk_quantity: ingredient.bulk_quantity * multiplier,
        bulk_unit: ingredient.bulk_unit.clone(),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdjustedRecipe {
    pub input_rows: usize,
    /// Surviving ingredients in upload order.
    pub ingredients: Vec<Ingredient>,
    pub excluded: Vec<String>,
    pub diagnostics: Vec<RowDiagnostic>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdjustmentSummary {
    pub input_rows: usize,
    pub output_rows: usize,
    pub excluded: Vec<String>,
    pub diagnostics: Vec<String>,
}

impl AdjustedRecipe {
    pub fn summary(&self) -> AdjustmentSummary {
        AdjustmentSummary {
            input_rows: self.input_rows,
            output_rows: self.ingredients.len(),
            excluded: self.excluded.clone(),
            diagnostics: self.diagnostics.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Converts and adjusts every row of `table`. Rows that fail conversion are
/// collected as diagnostics and the remaining rows are still processed.
pub fn adjust_recipe(table: &CanonicalTable, preferences: &DietaryPreferences) -> AdjustedRecipe {
    let mut adjusted = AdjustedRecipe {
        input_rows: table.rows.len(),
        ingredients: Vec::new(),
        excluded: Vec::new(),
        diagnostics: Vec::new(),
    };

    for outcome in table.ingredients() {
        match outcome {
            Ok(ingredient) => match adjust_quantities(&ingredient, preferences) {
                Some(scaled) => adjusted.ingredients.push(scaled),
                None => {
                    debug!("Excluding '{}' per preferences", ingredient.name);
                    adjusted.excluded.push(ingredient.name);
                }
            },
            Err(diagnostic) => adjusted.diagnostics.push(diagnostic),
        }
    }

    info!(
        "Adjusted {} of {} rows (x{}), {} excluded, {} skipped",
        adjusted.ingredients.len(),
        adjusted.input_rows,
        preferences.portion_multiplier(),
        adjusted.excluded.len(),
        adjusted.diagnostics.len()
    );
    adjusted
}
