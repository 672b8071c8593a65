use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::column_mapping::{find_matching_column, CanonicalField, DescriptiveField};
use crate::error::ReconcileError;
use crate::recipe_loader::RawTable;

/// Where a canonical field's values come from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnSource {
    /// A raw header matched one of the field's alternatives.
    Matched { index: usize, header: String },
    /// A bulk field read straight from the matched cooking column.
    CookingSubstitute { index: usize, header: String },
    /// Copied from another canonical field after the per-field pass.
    CopiedFrom { field: CanonicalField, index: usize },
    Missing,
}

impl ColumnSource {
    pub fn column_index(&self) -> Option<usize> {
        match self {
            ColumnSource::Matched { index, .. }
            | ColumnSource::CookingSubstitute { index, .. }
            | ColumnSource::CopiedFrom { index, .. } => Some(*index),
            ColumnSource::Missing => None,
        }
    }

    fn is_defaulted(&self) -> bool {
        matches!(self, ColumnSource::CopiedFrom { .. } | ColumnSource::Missing)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldResolution {
    pub field: CanonicalField,
    pub source: ColumnSource,
}

/// One upload row keyed by canonical field. `None` means the table has no such column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanonicalRow {
    pub ingredient: String,
    pub essential_quantity: Option<String>,
    pub essential_unit: Option<String>,
    pub cooking_quantity: Option<String>,
    pub cooking_unit: Option<String>,
    pub bulk_quantity: Option<String>,
    pub bulk_unit: Option<String>,
    pub notes: Option<String>,
    pub category: Option<String>,
    pub step: Option<String>,
}

impl CanonicalRow {
    pub fn value(&self, field: CanonicalField) -> Option<&str> {
        match field {
            CanonicalField::Ingredient => Some(self.ingredient.as_str()),
            CanonicalField::EssentialQuantity => self.essential_quantity.as_deref(),
            CanonicalField::EssentialUnit => self.essential_unit.as_deref(),
            CanonicalField::CookingQuantity => self.cooking_quantity.as_deref(),
            CanonicalField::CookingUnit => self.cooking_unit.as_deref(),
            CanonicalField::BulkQuantity => self.bulk_quantity.as_deref(),
            CanonicalField::BulkUnit => self.bulk_unit.as_deref(),
        }
    }

    pub fn descriptive(&self, field: DescriptiveField) -> Option<&str> {
        match field {
            DescriptiveField::Notes => self.notes.as_deref(),
            DescriptiveField::Category => self.category.as_deref(),
            DescriptiveField::Step => self.step.as_deref(),
        }
    }

    fn set(&mut self, field: CanonicalField, value: String) {
        match field {
            CanonicalField::Ingredient => self.ingredient = value,
            CanonicalField::EssentialQuantity => self.essential_quantity = Some(value),
            CanonicalField::EssentialUnit => self.essential_unit = Some(value),
            CanonicalField::CookingQuantity => self.cooking_quantity = Some(value),
            CanonicalField::CookingUnit => self.cooking_unit = Some(value),
            CanonicalField::BulkQuantity => self.bulk_quantity = Some(value),
            CanonicalField::BulkUnit => self.bulk_unit = Some(value),
        }
    }

    fn set_descriptive(&mut self, field: DescriptiveField, value: String) {
        match field {
            DescriptiveField::Notes => self.notes = Some(value),
            DescriptiveField::Category => self.category = Some(value),
            DescriptiveField::Step => self.step = Some(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalTable {
    /// Canonical fields with a source column, in canonical order.
    pub fields: Vec<CanonicalField>,
    pub descriptive: Vec<DescriptiveField>,
    pub rows: Vec<CanonicalRow>,
}

impl CanonicalTable {
    /// Distinct ingredient names in first-seen order.
    pub fn ingredient_options(&self) -> Vec<&str> {
        let mut options: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !options.contains(&row.ingredient.as_str()) {
                options.push(row.ingredient.as_str());
            }
        }
        options
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledRecipe {
    pub table: CanonicalTable,
    pub original_columns: Vec<String>,
    pub resolutions: Vec<FieldResolution>,
}

impl ReconciledRecipe {
    /// Fields that were copied from a counterpart or could not be found at all.
    pub fn defaulted_fields(&self) -> Vec<CanonicalField> {
        self.resolutions
            .iter()
            .filter(|r| r.source.is_defaulted())
            .map(|r| r.field)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedUpload {
    /// The table as uploaded, untouched, for diagnostic display.
    pub raw: RawTable,
    pub original_columns: Vec<String>,
    #[serde(serialize_with = "serialize_display")]
    pub reason: ReconcileError,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    Accepted(ReconciledRecipe),
    Rejected(RejectedUpload),
}

impl Reconciliation {
    pub fn is_ok(&self) -> bool {
        matches!(self, Reconciliation::Accepted(_))
    }

    pub fn original_columns(&self) -> &[String] {
        match self {
            Reconciliation::Accepted(recipe) => &recipe.original_columns,
            Reconciliation::Rejected(rejected) => &rejected.original_columns,
        }
    }
}

fn serialize_display<S: serde::Serializer>(
    value: &ReconcileError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Parses an upload and reconciles it. Unreadable uploads come back as
/// `Rejected` with an empty table and no original columns.
pub fn reconcile_bytes(bytes: &[u8]) -> Reconciliation {
    match RawTable::from_csv_bytes(bytes) {
        Ok(raw) => reconcile(raw),
        Err(reason) => {
            warn!("Upload could not be parsed: {}", reason);
            Reconciliation::Rejected(RejectedUpload {
                raw: RawTable::default(),
                original_columns: Vec::new(),
                reason,
            })
        }
    }
}

/// Maps the raw headers of `raw` onto the canonical fields.
pub fn reconcile(raw: RawTable) -> Reconciliation {
    let original_columns = raw.headers.clone();
    let mut sources: BTreeMap<CanonicalField, ColumnSource> = BTreeMap::new();

    for field in CanonicalField::ALL {
        let source = match find_matching_column(&raw.headers, field.alternatives()) {
            Some(index) => ColumnSource::Matched { index, header: raw.headers[index].clone() },
            None => match field.bulk_fallback() {
                Some(cooking) if cooking_pair_resolved(&sources) => {
                    match sources.get(&cooking) {
                        Some(ColumnSource::Matched { index, header }) => ColumnSource::CookingSubstitute {
                            index: *index,
                            header: header.clone(),
                        },
                        _ => ColumnSource::Missing,
                    }
                }
                _ => ColumnSource::Missing,
            },
        };
        debug!("Resolved `{}` -> {:?}", field, source);
        sources.insert(field, source);
    }

    if sources.get(&CanonicalField::Ingredient) == Some(&ColumnSource::Missing) {
        warn!(
            "No ingredient column among {:?}; upload rejected",
            original_columns
        );
        return Reconciliation::Rejected(RejectedUpload {
            raw,
            original_columns,
            reason: ReconcileError::MissingRequiredField,
        });
    }

    // Essential and cooking stand in for each other, then bulk may borrow the
    // filled-in cooking columns.
    for field in CanonicalField::ALL {
        if let Some(donor) = field.cross_fill_donor() {
            fill_from(&mut sources, field, donor);
        }
    }
    for field in CanonicalField::ALL {
        if let Some(cooking) = field.bulk_fallback() {
            if cooking_pair_resolved(&sources) {
                fill_from(&mut sources, field, cooking);
            }
        }
    }

    let resolutions: Vec<FieldResolution> = sources
        .into_iter()
        .map(|(field, source)| FieldResolution { field, source })
        .collect();

    let descriptive: Vec<(DescriptiveField, usize)> = DescriptiveField::ALL
        .iter()
        .filter_map(|field| find_matching_column(&raw.headers, field.alternatives()).map(|idx| (*field, idx)))
        .collect();

    let rows = raw
        .rows
        .iter()
        .map(|cells| {
            let mut row = CanonicalRow::default();
            for resolution in &resolutions {
                if let Some(idx) = resolution.source.column_index() {
                    row.set(resolution.field, cells[idx].clone());
                }
            }
            for (field, idx) in &descriptive {
                row.set_descriptive(*field, cells[*idx].clone());
            }
            row
        })
        .collect();

    let table = CanonicalTable {
        fields: resolutions
            .iter()
            .filter(|r| r.source.column_index().is_some())
            .map(|r| r.field)
            .collect(),
        descriptive: descriptive.iter().map(|(field, _)| *field).collect(),
        rows,
    };

    let recipe = ReconciledRecipe { table, original_columns, resolutions };
    let defaulted = recipe.defaulted_fields();
    if !defaulted.is_empty() {
        let names: Vec<&str> = defaulted.iter().map(|f| f.canonical_name()).collect();
        warn!("Some columns were missing and filled with defaults: {:?}", names);
    }
    info!(
        "Reconciled {} rows onto {} canonical fields",
        recipe.table.rows.len(),
        recipe.table.fields.len()
    );

    Reconciliation::Accepted(recipe)
}

fn cooking_pair_resolved(sources: &BTreeMap<CanonicalField, ColumnSource>) -> bool {
    [CanonicalField::CookingQuantity, CanonicalField::CookingUnit]
        .iter()
        .all(|f| sources.get(f).and_then(ColumnSource::column_index).is_some())
}

fn fill_from(
    sources: &mut BTreeMap<CanonicalField, ColumnSource>,
    target: CanonicalField,
    donor: CanonicalField,
) {
    if sources.get(&target) != Some(&ColumnSource::Missing) {
        return;
    }
    if let Some(index) = sources.get(&donor).and_then(ColumnSource::column_index) {
        debug!("Filling `{}` from `{}`", target, donor);
        sources.insert(target, ColumnSource::CopiedFrom { field: donor, index });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(content: &str) -> RawTable {
        RawTable::from_csv_str(content).unwrap()
    }

    fn accepted(content: &str) -> ReconciledRecipe {
        match reconcile(raw(content)) {
            Reconciliation::Accepted(recipe) => recipe,
            Reconciliation::Rejected(r) => panic!("expected acceptance, got {:?}", r.reason),
        }
    }

    fn source_of(recipe: &ReconciledRecipe, field: CanonicalField) -> &ColumnSource {
        &recipe.resolutions.iter().find(|r| r.field == field).unwrap().source
    }

    const FULL: &str = "Ingredients,Quantity,Purchasing Unit,Quantity.1,Cooking Unit,Bulk Purchasing Quantity,Bulk Purchasing Unit\n\
                        Black Lentils,22.5,grams,0.794,ounce,25.42,ounce\n";

    #[test]
    fn test_full_header_set_matches_directly() {
        let recipe = accepted(FULL);
        assert_eq!(recipe.table.fields, CanonicalField::ALL.to_vec());
        assert!(recipe.defaulted_fields().is_empty());
        let row = &recipe.table.rows[0];
        assert_eq!(row.ingredient, "Black Lentils");
        assert_eq!(row.essential_quantity.as_deref(), Some("22.5"));
        assert_eq!(row.cooking_unit.as_deref(), Some("ounce"));
        assert_eq!(row.bulk_quantity.as_deref(), Some("25.42"));
    }

    #[test]
    fn test_alternative_spellings_resolve_same_fields() {
        let variants = [
            "ingredient,essential quantity,purchasing unit,cooking quantity,cooking unit,bulk cooking quantity,bulk cooking unit\nRice,1,g,2,oz,3,lb\n",
            "Ingredient,Essential Quantity,Purchasing Unit,Cooking Quantity,Cooking Unit,Bulk Purchasing Quantity,Bulk Purchasing Unit\nRice,1,g,2,oz,3,lb\n",
        ];
        for content in variants {
            let row = accepted(content).table.rows.remove(0);
            assert_eq!(row.ingredient, "Rice");
            assert_eq!(row.essential_quantity.as_deref(), Some("1"));
            assert_eq!(row.cooking_quantity.as_deref(), Some("2"));
            assert_eq!(row.bulk_unit.as_deref(), Some("lb"));
        }
    }

    #[test]
    fn test_newline_headers_match_after_normalization() {
        let content = "ingredients,quantity,\"Purchasing \nUnit\",quantity.1,\"cooking_\nunit\"\nRice,1,g,2,oz\n";
        let recipe = accepted(content);
        assert!(matches!(
            source_of(&recipe, CanonicalField::EssentialUnit),
            ColumnSource::Matched { index: 2, .. }
        ));
        assert_eq!(recipe.table.rows[0].essential_unit.as_deref(), Some("g"));
    }

    #[test]
    fn test_bulk_falls_back_to_cooking() {
        let recipe = accepted("ingredients,quantity,purchasing unit,quantity.1,cooking unit\nRice,1,g,2,oz\n");
        let row = &recipe.table.rows[0];
        assert_eq!(row.bulk_quantity, row.cooking_quantity);
        assert_eq!(row.bulk_unit, row.cooking_unit);
        assert!(matches!(
            source_of(&recipe, CanonicalField::BulkQuantity),
            ColumnSource::CookingSubstitute { .. }
        ));
        // Direct cooking substitution is not reported as a default.
        assert!(recipe.defaulted_fields().is_empty());
    }

    #[test]
    fn test_essential_only_fills_cooking_and_bulk() {
        let recipe = accepted("ingredients,quantity,purchasing unit\nRice,1.5,cups\nOats,2,cups\n");
        for row in &recipe.table.rows {
            assert_eq!(row.cooking_quantity, row.essential_quantity);
            assert_eq!(row.bulk_quantity, row.essential_quantity);
            assert_eq!(row.cooking_unit, row.essential_unit);
            assert_eq!(row.bulk_unit, row.essential_unit);
        }
        assert_eq!(
            recipe.defaulted_fields(),
            vec![
                CanonicalField::CookingQuantity,
                CanonicalField::CookingUnit,
                CanonicalField::BulkQuantity,
                CanonicalField::BulkUnit,
            ]
        );
    }

    #[test]
    fn test_cooking_only_fills_essential() {
        let recipe = accepted("Ingredient,Cooking Quantity,Cooking Unit\nSalt,3,tsp\n");
        let row = &recipe.table.rows[0];
        assert_eq!(row.essential_quantity.as_deref(), Some("3"));
        assert_eq!(row.essential_unit.as_deref(), Some("tsp"));
        assert_eq!(
            source_of(&recipe, CanonicalField::EssentialQuantity),
            &ColumnSource::CopiedFrom { field: CanonicalField::CookingQuantity, index: 1 }
        );
    }

    #[test]
    fn test_unresolvable_quantity_stays_missing() {
        let recipe = accepted("Ingredients,Notes\nRice,rinse\n");
        assert_eq!(recipe.table.fields, vec![CanonicalField::Ingredient]);
        assert_eq!(recipe.defaulted_fields().len(), 6);
        assert_eq!(recipe.table.rows[0].essential_quantity, None);
        assert_eq!(recipe.table.rows[0].notes.as_deref(), Some("rinse"));
    }

    #[test]
    fn test_missing_ingredient_returns_raw_table_unchanged() {
        let table = raw("name,quantity\nRice,1\n");
        let expected = table.clone();
        match reconcile(table) {
            Reconciliation::Rejected(rejected) => {
                assert_eq!(rejected.raw, expected);
                assert_eq!(rejected.original_columns, vec!["name", "quantity"]);
                assert_eq!(rejected.reason, ReconcileError::MissingRequiredField);
            }
            Reconciliation::Accepted(_) => panic!("expected rejection"),
        }
    }

    #[test]
    fn test_unparseable_bytes_are_rejected() {
        let result = reconcile_bytes(b"");
        assert!(!result.is_ok());
        assert!(result.original_columns().is_empty());
        match result {
            Reconciliation::Rejected(rejected) => assert_eq!(rejected.reason, ReconcileError::EmptyTable),
            Reconciliation::Accepted(_) => panic!("expected rejection"),
        }
    }

    #[test]
    fn test_descriptive_columns_are_carried() {
        let content = "Ingredients,Quantity,Purchasing Unit,Ingredient Group,Special Instructions,Meal Prep Step\n\
                       Rice,1,g,Grain,Rinse,2\n";
        let recipe = accepted(content);
        assert_eq!(
            recipe.table.descriptive,
            vec![DescriptiveField::Notes, DescriptiveField::Category, DescriptiveField::Step]
        );
        let row = &recipe.table.rows[0];
        assert_eq!(row.descriptive(DescriptiveField::Category), Some("Grain"));
        assert_eq!(row.descriptive(DescriptiveField::Notes), Some("Rinse"));
        assert_eq!(row.descriptive(DescriptiveField::Step), Some("2"));
    }

    #[test]
    fn test_row_order_and_count_preserved() {
        let recipe = accepted("ingredients,quantity,purchasing unit\nC,1,g\nA,2,g\nB,3,g\nA,4,g\n");
        let names: Vec<&str> = recipe.table.rows.iter().map(|r| r.ingredient.as_str()).collect();
        assert_eq!(names, vec!["C", "A", "B", "A"]);
        assert_eq!(recipe.table.ingredient_options(), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_duplicate_quantity_headers_feed_cooking() {
        let recipe = accepted("Ingredients,Quantity,Purchasing Unit,Quantity,Cooking Unit\nRice,100,g,3.5,oz\n");
        let row = &recipe.table.rows[0];
        assert_eq!(row.essential_quantity.as_deref(), Some("100"));
        assert_eq!(row.cooking_quantity.as_deref(), Some("3.5"));
    }
}
