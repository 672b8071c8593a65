use clap::ValueEnum;
use serde::Serialize;
use std::fmt;

use crate::error::PreferenceError;

pub const MIN_PORTION_MULTIPLIER: f64 = 0.5;
pub const MAX_PORTION_MULTIPLIER: f64 = 3.0;
pub const DEFAULT_PORTION_MULTIPLIER: f64 = 1.0;

/// Accepted and recorded, but no restriction removes any ingredient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
pub enum DietaryRestriction {
    Vegetarian,
    Vegan,
    #[value(name = "gluten-free")]
    GlutenFree,
    #[value(name = "dairy-free")]
    DairyFree,
}

impl fmt::Display for DietaryRestriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DietaryRestriction::Vegetarian => "Vegetarian",
            DietaryRestriction::Vegan => "Vegan",
            DietaryRestriction::GlutenFree => "Gluten-free",
            DietaryRestriction::DairyFree => "Dairy-free",
        };
        f.write_str(label)
    }
}

/// The user's choices for one adjustment run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DietaryPreferences {
    allergies: Vec<String>,
    restrictions: Vec<DietaryRestriction>,
    portion_multiplier: f64,
    exclude_ingredients: Vec<String>,
}

impl Default for DietaryPreferences {
    fn default() -> Self {
        Self {
            allergies: Vec::new(),
            restrictions: Vec::new(),
            portion_multiplier: DEFAULT_PORTION_MULTIPLIER,
            exclude_ingredients: Vec::new(),
        }
    }
}

impl DietaryPreferences {
    pub fn new(portion_multiplier: f64) -> Result<Self, PreferenceError> {
        Ok(Self {
            portion_multiplier: validate_portion_multiplier(portion_multiplier)?,
            ..Self::default()
        })
    }

    pub fn with_allergies<I, S>(mut self, allergies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allergies.extend(allergies.into_iter().map(Into::into));
        self
    }

    pub fn with_exclusions<I, S>(mut self, ingredients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_ingredients.extend(ingredients.into_iter().map(Into::into));
        self
    }

    pub fn with_restrictions(mut self, restrictions: impl IntoIterator<Item = DietaryRestriction>) -> Self {
        self.restrictions.extend(restrictions);
        self
    }

    pub fn allergies(&self) -> &[String] {
        &self.allergies
    }

    pub fn restrictions(&self) -> &[DietaryRestriction] {
        &self.restrictions
    }

    pub fn exclude_ingredients(&self) -> &[String] {
        &self.exclude_ingredients
    }

    pub fn portion_multiplier(&self) -> f64 {
        self.portion_multiplier
    }

    /// Case-insensitive match against both the allergy and exclusion lists.
    pub fn excludes(&self, ingredient_name: &str) -> bool {
        let name = ingredient_name.to_lowercase();
        self.allergies
            .iter()
            .chain(self.exclude_ingredients.iter())
            .any(|entry| entry.to_lowercase() == name)
    }
}

pub fn validate_portion_multiplier(value: f64) -> Result<f64, PreferenceError> {
    if (MIN_PORTION_MULTIPLIER..=MAX_PORTION_MULTIPLIER).contains(&value) {
        Ok(value)
    } else {
        Err(PreferenceError::PortionOutOfRange {
            value,
            min: MIN_PORTION_MULTIPLIER,
            max: MAX_PORTION_MULTIPLIER,
        })
    }
}
