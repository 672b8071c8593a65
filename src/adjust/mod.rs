pub mod portion_adjuster;
pub mod preferences;

pub use portion_adjuster::{adjust_quantities, adjust_recipe, AdjustedRecipe, AdjustmentSummary};
pub use preferences::{
    validate_portion_multiplier, DietaryPreferences, DietaryRestriction, DEFAULT_PORTION_MULTIPLIER,
    MAX_PORTION_MULTIPLIER, MIN_PORTION_MULTIPLIER,
};
