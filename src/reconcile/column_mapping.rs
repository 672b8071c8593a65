use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// The seven fields every accepted header spelling is mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Ingredient,
    EssentialQuantity,
    EssentialUnit,
    CookingQuantity,
    CookingUnit,
    BulkQuantity,
    BulkUnit,
}

impl CanonicalField {
    /// Resolution order; bulk fields come last so they can fall back on cooking.
    pub const ALL: [CanonicalField; 7] = [
        CanonicalField::Ingredient,
        CanonicalField::EssentialQuantity,
        CanonicalField::EssentialUnit,
        CanonicalField::CookingQuantity,
        CanonicalField::CookingUnit,
        CanonicalField::BulkQuantity,
        CanonicalField::BulkUnit,
    ];

    pub fn canonical_name(&self) -> &'static str {
        match self {
            CanonicalField::Ingredient => "ingredient",
            CanonicalField::EssentialQuantity => "essential_quantity",
            CanonicalField::EssentialUnit => "essential_unit",
            CanonicalField::CookingQuantity => "cooking_quantity",
            CanonicalField::CookingUnit => "cooking_unit",
            CanonicalField::BulkQuantity => "bulk_quantity",
            CanonicalField::BulkUnit => "bulk_unit",
        }
    }

    /// Accepted header spellings, highest priority first.
    pub fn alternatives(&self) -> &'static [&'static str] {
        match self {
            CanonicalField::Ingredient => &["ingredients", "Ingredients", "ingredient", "Ingredient"],
            CanonicalField::EssentialQuantity => {
                &["quantity", "Quantity", "essential quantity", "Essential Quantity"]
            }
            CanonicalField::EssentialUnit => {
                &["purchasing\nunit", "Purchasing\nUnit", "purchasing unit", "Purchasing Unit"]
            }
            CanonicalField::CookingQuantity => {
                &["quantity.1", "Quantity.1", "cooking quantity", "Cooking Quantity"]
            }
            CanonicalField::CookingUnit => {
                &["cooking_\nunit", "Cooking \nUnit", "cooking unit", "Cooking Unit"]
            }
            CanonicalField::BulkQuantity => &[
                "bulk_purchasing\nquantity",
                "Bulk Purchasing\nQuantity",
                "bulk purchasing quantity",
                "Bulk Purchasing Quantity",
                "Bulk Cooking\nQuantity",
                "bulk cooking quantity",
            ],
            CanonicalField::BulkUnit => &[
                "bulk_purchasing_\nunit",
                "Bulk Purchasing \nUnit",
                "bulk purchasing unit",
                "Bulk Purchasing Unit",
                "Bulk Cooking \nUnit",
                "bulk cooking unit",
            ],
        }
    }

    /// The cooking field a bulk field may borrow from when no bulk column exists.
    pub fn bulk_fallback(&self) -> Option<CanonicalField> {
        match self {
            CanonicalField::BulkQuantity => Some(CanonicalField::CookingQuantity),
            CanonicalField::BulkUnit => Some(CanonicalField::CookingUnit),
            _ => None,
        }
    }

    /// Essential and cooking fields stand in for each other when one side is missing.
    pub fn cross_fill_donor(&self) -> Option<CanonicalField> {
        match self {
            CanonicalField::EssentialQuantity => Some(CanonicalField::CookingQuantity),
            CanonicalField::EssentialUnit => Some(CanonicalField::CookingUnit),
            CanonicalField::CookingQuantity => Some(CanonicalField::EssentialQuantity),
            CanonicalField::CookingUnit => Some(CanonicalField::EssentialUnit),
            _ => None,
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Optional columns carried through for display; never required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptiveField {
    Notes,
    Category,
    Step,
}

impl DescriptiveField {
    pub const ALL: [DescriptiveField; 3] =
        [DescriptiveField::Notes, DescriptiveField::Category, DescriptiveField::Step];

    pub fn canonical_name(&self) -> &'static str {
        match self {
            DescriptiveField::Notes => "notes",
            DescriptiveField::Category => "category",
            DescriptiveField::Step => "step",
        }
    }

    pub fn alternatives(&self) -> &'static [&'static str] {
        match self {
            DescriptiveField::Notes => &["Special Instructions", "Special Instruction", "Notes"],
            DescriptiveField::Category => &["Ingredient Group", "Category", "Group"],
            DescriptiveField::Step => &["Meal Prep Step", "Step", "Prep Step"],
        }
    }
}

/// Trims, lowercases and drops every newline and space.
pub fn normalize_column_name(col: &str) -> String {
    col.trim().to_lowercase().replace(['\n', ' '], "")
}

/// Returns the index of the header matching `alternatives`, trying exact
/// spellings first and normalized spellings second. Alternatives are tried in
/// order; among headers that normalize identically the leftmost wins.
pub fn find_matching_column(headers: &[String], alternatives: &[&str]) -> Option<usize> {
    for alt in alternatives {
        if let Some(idx) = headers.iter().position(|h| h == alt) {
            return Some(idx);
        }
    }

    let mut normalized_headers: HashMap<String, usize> = HashMap::new();
    for (idx, header) in headers.iter().enumerate() {
        normalized_headers.entry(normalize_column_name(header)).or_insert(idx);
    }
    alternatives
        .iter()
        .find_map(|alt| normalized_headers.get(&normalize_column_name(alt)).copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name("  Purchasing \nUnit "), "purchasingunit");
        assert_eq!(normalize_column_name("Quantity.1"), "quantity.1");
        assert_eq!(normalize_column_name("cooking_\nunit"), "cooking_unit");
    }

    #[test]
    fn test_every_alternative_resolves_its_field() {
        for field in CanonicalField::ALL {
            for alt in field.alternatives() {
                let cols = headers(&["unrelated", alt]);
                assert_eq!(
                    find_matching_column(&cols, field.alternatives()),
                    Some(1),
                    "{} should resolve via {:?}",
                    field,
                    alt
                );
            }
        }
    }

    #[test]
    fn test_exact_match_prefers_listed_order() {
        // "Quantity" is listed before "essential quantity" even though it comes later here.
        let cols = headers(&["essential quantity", "Quantity"]);
        assert_eq!(find_matching_column(&cols, CanonicalField::EssentialQuantity.alternatives()), Some(1));
    }

    #[test]
    fn test_normalized_match() {
        let cols = headers(&["INGREDIENTS ", "Purchasing \nUnit"]);
        assert_eq!(find_matching_column(&cols, CanonicalField::Ingredient.alternatives()), Some(0));
        assert_eq!(find_matching_column(&cols, CanonicalField::EssentialUnit.alternatives()), Some(1));
    }

    #[test]
    fn test_normalized_collision_takes_leftmost() {
        let cols = headers(&["Cooking  Unit", "COOKING UNIT"]);
        assert_eq!(find_matching_column(&cols, CanonicalField::CookingUnit.alternatives()), Some(0));
    }

    #[test]
    fn test_unmatched_returns_none() {
        let cols = headers(&["name", "amount"]);
        assert_eq!(find_matching_column(&cols, CanonicalField::Ingredient.alternatives()), None);
    }

    #[test]
    fn test_descriptive_fields() {
        let cols = headers(&["Ingredients", "Ingredient Group", "notes"]);
        assert_eq!(find_matching_column(&cols, DescriptiveField::Category.alternatives()), Some(1));
        assert_eq!(find_matching_column(&cols, DescriptiveField::Notes.alternatives()), Some(2));
        assert_eq!(find_matching_column(&cols, DescriptiveField::Step.alternatives()), None);
    }
}
