use anyhow::{bail, Context, Result};
use meal_prep::adjust::{adjust_recipe, AdjustmentSummary, DietaryPreferences};
use meal_prep::cli::{parse_args, AdjustArgs, Command, InspectArgs};
use meal_prep::preview::{preview_upload, UploadPreview};
use meal_prep::recipe_export::{
    adjusted_recipe_csv, canonical_table_csv, template_csv, ADJUSTED_FILE_NAME, EXAMPLE_FILE_NAME,
    TEMPLATE_FILE_NAME,
};
use meal_prep::reconcile::{
    reconcile_bytes, CanonicalField, ColumnSource, FieldResolution, ReconcileCache, ReconciledRecipe,
    Reconciliation,
};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, PartialEq)]
enum Destination {
    Stdout,
    File(PathBuf),
}

fn destination(output_dir: Option<&Path>, file_name: &str) -> Destination {
    match output_dir {
        Some(dir) => Destination::File(dir.join(file_name)),
        None => Destination::Stdout,
    }
}

async fn emit(destination: &Destination, contents: &str) -> Result<()> {
    match destination {
        Destination::Stdout => print!("{}", contents),
        Destination::File(path) => {
            fs::write(path, contents)
                .await
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            info!("Wrote {}", path.display());
        }
    }
    Ok(())
}

fn adjusted_file_name(recipe_file: &Path) -> String {
    recipe_file
        .file_stem()
        .map(|stem| format!("{}_adjusted.csv", stem.to_string_lossy()))
        .unwrap_or_else(|| ADJUSTED_FILE_NAME.to_string())
}

#[derive(Serialize)]
struct FileSummary<'a> {
    file: String,
    original_columns: &'a [String],
    defaulted_fields: Vec<CanonicalField>,
    preferences: &'a DietaryPreferences,
    #[serde(flatten)]
    adjustment: AdjustmentSummary,
}

/// Pairs each recipe file with where its adjusted CSV goes. Two inputs that
/// would land on the same file are refused before anything is written.
fn plan_destinations(recipe_files: &[PathBuf], output_dir: Option<&Path>) -> Result<Vec<Destination>> {
    let mut claimed: HashMap<PathBuf, &Path> = HashMap::new();
    let mut destinations = Vec::with_capacity(recipe_files.len());
    for recipe_file in recipe_files {
        let destination = destination(output_dir, &adjusted_file_name(recipe_file));
        if let Destination::File(path) = &destination {
            if let Some(previous) = claimed.insert(path.clone(), recipe_file.as_path()) {
                bail!(
                    "'{}' and '{}' would both be written to '{}'",
                    previous.display(),
                    recipe_file.display(),
                    path.display()
                );
            }
        }
        destinations.push(destination);
    }
    Ok(destinations)
}

async fn run_adjust(args: AdjustArgs) -> Result<()> {
    if args.recipe_files.len() > 1 && args.output_dir.is_none() {
        bail!("--output-dir is required when adjusting more than one recipe file");
    }
    let destinations = plan_destinations(&args.recipe_files, args.output_dir.as_deref())?;
    if let Some(dir) = &args.output_dir {
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create output directory '{}'", dir.display()))?;
    }

    let preferences = DietaryPreferences::new(args.portion)?
        .with_allergies(args.allergies.iter().cloned())
        .with_exclusions(args.exclude_ingredients.iter().cloned())
        .with_restrictions(args.restrictions.iter().copied());
    if !preferences.restrictions().is_empty() {
        let labels: Vec<String> = preferences.restrictions().iter().map(ToString::to_string).collect();
        info!("Dietary restrictions {:?} are recorded but do not filter ingredients", labels);
    }

    let mut cache = ReconcileCache::new();
    let mut rejected_files = Vec::new();

    for (recipe_file, output) in args.recipe_files.iter().zip(&destinations) {
        let bytes = fs::read(recipe_file)
            .await
            .with_context(|| format!("Failed to read recipe file '{}'", recipe_file.display()))?;

        match cache.reconcile(&bytes) {
            Reconciliation::Accepted(recipe) => {
                adjust_one(recipe_file, recipe, &preferences, output, args.summary).await?;
            }
            Reconciliation::Rejected(rejection) => {
                error!(
                    "'{}' doesn't match the required format: {}",
                    recipe_file.display(),
                    rejection.reason
                );
                info!("Original columns: {:?}", rejection.original_columns);
                info!("Emitting the example format");
                let template = template_csv()?;
                emit(&destination(args.output_dir.as_deref(), EXAMPLE_FILE_NAME), &template).await?;
                rejected_files.push(recipe_file.display().to_string());
            }
        }
    }

    if !rejected_files.is_empty() {
        bail!(
            "{} recipe file(s) could not be reconciled: {}",
            rejected_files.len(),
            rejected_files.join(", ")
        );
    }
    Ok(())
}

async fn adjust_one(
    recipe_file: &Path,
    recipe: &ReconciledRecipe,
    preferences: &DietaryPreferences,
    output: &Destination,
    summary: bool,
) -> Result<()> {
    info!("Original columns of '{}': {:?}", recipe_file.display(), recipe.original_columns);

    let options = recipe.table.ingredient_options();
    for choice in preferences.allergies().iter().chain(preferences.exclude_ingredients()) {
        if !options.iter().any(|o| o.to_lowercase() == choice.to_lowercase()) {
            warn!("'{}' does not match any ingredient in '{}'", choice, recipe_file.display());
        }
    }

    let adjusted = adjust_recipe(&recipe.table, preferences);

    if summary {
        let summary = FileSummary {
            file: recipe_file.display().to_string(),
            original_columns: &recipe.original_columns,
            defaulted_fields: recipe.defaulted_fields(),
            preferences,
            adjustment: adjusted.summary(),
        };
        eprintln!("{}", serde_json::to_string_pretty(&summary)?);
    }

    if adjusted.ingredients.is_empty() {
        warn!("No ingredients remain in '{}' after applying preferences", recipe_file.display());
        return Ok(());
    }

    let csv = adjusted_recipe_csv(&adjusted.ingredients)?;
    emit(output, &csv).await
}

#[derive(Serialize)]
struct InspectReport<'a> {
    file: String,
    preview: UploadPreview,
    ok: bool,
    original_columns: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    rejection: Option<String>,
    resolutions: &'a [FieldResolution],
    defaulted_fields: Vec<CanonicalField>,
    ingredient_options: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    canonical_csv: Option<String>,
}

async fn run_inspect(args: InspectArgs) -> Result<()> {
    let bytes = fs::read(&args.recipe_file)
        .await
        .with_context(|| format!("Failed to read recipe file '{}'", args.recipe_file.display()))?;

    let preview = preview_upload(&bytes)?;
    let reconciliation = reconcile_bytes(&bytes);

    let mut report = InspectReport {
        file: args.recipe_file.display().to_string(),
        preview,
        ok: reconciliation.is_ok(),
        original_columns: reconciliation.original_columns(),
        rejection: None,
        resolutions: &[],
        defaulted_fields: Vec::new(),
        ingredient_options: Vec::new(),
        canonical_csv: None,
    };
    match &reconciliation {
        Reconciliation::Accepted(recipe) => {
            report.resolutions = recipe.resolutions.as_slice();
            report.defaulted_fields = recipe.defaulted_fields();
            report.ingredient_options = recipe.table.ingredient_options();
            report.canonical_csv = Some(canonical_table_csv(&recipe.table)?);
        }
        Reconciliation::Rejected(rejection) => {
            report.rejection = Some(rejection.reason.to_string());
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report)?;
    }
    Ok(())
}

fn describe_source(source: &ColumnSource) -> String {
    match source {
        ColumnSource::Matched { header, .. } => format!("{:?}", header),
        ColumnSource::CookingSubstitute { header, .. } => format!("{:?} (cooking column)", header),
        ColumnSource::CopiedFrom { field, .. } => format!("copied from {}", field),
        ColumnSource::Missing => "missing".to_string(),
    }
}

fn print_report(report: &InspectReport<'_>) -> Result<()> {
    println!("File: {}", report.file);
    println!("First {} lines of uploaded file:", report.preview.lines.len());
    for (i, line) in report.preview.lines.iter().enumerate() {
        println!("  Line {}: {}", i + 1, line);
    }
    match report.preview.detected_delimiter {
        Some(delimiter) => println!("Detected delimiter: {:?}", delimiter),
        None => println!("Detected delimiter: none"),
    }
    println!("Original columns: {:?}", report.original_columns);

    if let Some(reason) = &report.rejection {
        println!("\nThe uploaded file doesn't match the required format: {}", reason);
        println!("Example format:\n{}", template_csv()?);
        return Ok(());
    }

    println!("\nColumn mapping:");
    for resolution in report.resolutions {
        println!("  {:<20} <- {}", resolution.field.canonical_name(), describe_source(&resolution.source));
    }
    if !report.defaulted_fields.is_empty() {
        let names: Vec<&str> = report.defaulted_fields.iter().map(|f| f.canonical_name()).collect();
        println!("Some columns were missing and filled with defaults: {:?}", names);
    }
    println!("Ingredients: {}", report.ingredient_options.join(", "));
    if let Some(csv) = &report.canonical_csv {
        println!("\nCanonical recipe:\n{}", csv);
    }
    Ok(())
}

async fn run_template(output: Option<PathBuf>) -> Result<()> {
    let template = template_csv()?;
    let destination = match output {
        Some(path) => {
            let is_dir = fs::metadata(&path).await.map(|m| m.is_dir()).unwrap_or(false);
            Destination::File(if is_dir { path.join(TEMPLATE_FILE_NAME) } else { path })
        }
        None => Destination::Stdout,
    };
    emit(&destination, &template).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_args();
    match cli.command {
        Command::Adjust(args) => run_adjust(args).await,
        Command::Inspect(args) => run_inspect(args).await,
        Command::Template { output } => run_template(output).await,
    }
}
