use csv::{Terminator, Writer, WriterBuilder};
use serde::Serialize;

use crate::error::ExportError;
use crate::ingredient::Ingredient;
use crate::reconcile::CanonicalTable;

pub const TEMPLATE_FILE_NAME: &str = "recipe_template.csv";
pub const EXAMPLE_FILE_NAME: &str = "example_recipe.csv";
pub const ADJUSTED_FILE_NAME: &str = "adjusted_recipe.csv";

/// A row of the example upload, with the header spellings users are shown.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateRow {
    #[serde(rename = "Ingredients")]
    pub ingredients: &'static str,
    #[serde(rename = "Quantity")]
    pub quantity: f64,
    #[serde(rename = "Purchasing Unit")]
    pub purchasing_unit: &'static str,
    #[serde(rename = "Quantity.1")]
    pub cooking_quantity: f64,
    #[serde(rename = "Cooking Unit")]
    pub cooking_unit: &'static str,
    #[serde(rename = "Bulk Purchasing Quantity")]
    pub bulk_purchasing_quantity: f64,
    #[serde(rename = "Bulk Purchasing Unit")]
    pub bulk_purchasing_unit: &'static str,
    #[serde(rename = "Ingredient Group")]
    pub ingredient_group: &'static str,
    #[serde(rename = "Special Instructions")]
    pub special_instructions: &'static str,
    #[serde(rename = "Meal Prep Step")]
    pub meal_prep_step: &'static str,
    #[serde(rename = "Meal Prep Box Type")]
    pub meal_prep_box_type: &'static str,
}

pub fn example_template() -> Vec<TemplateRow> {
    vec![TemplateRow {
        ingredients: "Black Lentils",
        quantity: 22.5,
        purchasing_unit: "grams",
        cooking_quantity: 0.794,
        cooking_unit: "ounce",
        bulk_purchasing_quantity: 25.42,
        bulk_purchasing_unit: "ounce",
        ingredient_group: "Protein",
        special_instructions: "Rinse before cooking",
        meal_prep_step: "1",
        meal_prep_box_type: "Prep",
    }]
}

pub fn template_csv() -> Result<String, ExportError> {
    serialize_rows(&example_template())
}

/// Header is `name,essential_quantity,...,bulk_unit`; floats keep a decimal point (`45.0`).
pub fn adjusted_recipe_csv(ingredients: &[Ingredient]) -> Result<String, ExportError> {
    serialize_rows(ingredients)
}

/// The reconciled table under canonical names, resolved fields only.
pub fn canonical_table_csv(table: &CanonicalTable) -> Result<String, ExportError> {
    let mut wtr = new_writer();

    let mut header: Vec<&str> = table.fields.iter().map(|f| f.canonical_name()).collect();
    header.extend(table.descriptive.iter().map(|f| f.canonical_name()));
    wtr.write_record(&header)?;

    for row in &table.rows {
        let mut record: Vec<&str> = table
            .fields
            .iter()
            .map(|f| row.value(*f).unwrap_or_default())
            .collect();
        record.extend(table.descriptive.iter().map(|f| row.descriptive(*f).unwrap_or_default()));
        wtr.write_record(&record)?;
    }

    finish(wtr)
}

fn new_writer() -> Writer<Vec<u8>> {
    WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

fn serialize_rows<T: Serialize>(rows: &[T]) -> Result<String, ExportError> {
    let mut wtr = new_writer();
    for row in rows {
        wtr.serialize(row)?;
    }
    finish(wtr)
}

fn finish(wtr: Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}
