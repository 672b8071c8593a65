use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::adjust::{validate_portion_multiplier, DietaryRestriction, DEFAULT_PORTION_MULTIPLIER};

#[derive(Parser, Debug)]
#[command(author, version, about = "Personalized meal prep calculator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Reconcile recipe CSVs and write portion-adjusted copies
    Adjust(AdjustArgs),
    /// Show how a recipe CSV's columns are mapped
    Inspect(InspectArgs),
    /// Write the example recipe CSV
    Template {
        /// Destination file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct AdjustArgs {
    /// Recipe CSV files
    #[arg(required = true)]
    pub recipe_files: Vec<PathBuf>,

    /// Ingredient you are allergic to (repeatable, case-insensitive)
    #[arg(short, long = "allergy")]
    pub allergies: Vec<String>,

    /// Ingredient to leave out (repeatable, case-insensitive)
    #[arg(short = 'x', long = "exclude")]
    pub exclude_ingredients: Vec<String>,

    /// Dietary restriction; recorded but not used for filtering
    #[arg(short, long = "restriction", value_enum)]
    pub restrictions: Vec<DietaryRestriction>,

    /// Portion size multiplier
    #[arg(short, long, default_value_t = DEFAULT_PORTION_MULTIPLIER, value_parser = parse_portion_multiplier)]
    pub portion: f64,

    /// Directory for adjusted CSVs (stdout for a single file when omitted)
    #[arg(short, long, env = "MEAL_PREP_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print a JSON summary per file to stderr
    #[arg(long)]
    pub summary: bool,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Recipe CSV file
    pub recipe_file: PathBuf,

    /// Emit the report as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_portion_multiplier(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    validate_portion_multiplier(value).map_err(|e| e.to_string())
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjust_flags() {
        let cli = Cli::try_parse_from([
            "meal_prep", "adjust", "lunch.csv", "-a", "milk", "-x", "salt", "--exclude", "pepper",
            "-r", "gluten-free", "-p", "2.5",
        ])
        .unwrap();
        match cli.command {
            Command::Adjust(args) => {
                assert_eq!(args.recipe_files, vec![PathBuf::from("lunch.csv")]);
                assert_eq!(args.allergies, vec!["milk"]);
                assert_eq!(args.exclude_ingredients, vec!["salt", "pepper"]);
                assert_eq!(args.restrictions, vec![DietaryRestriction::GlutenFree]);
                assert_eq!(args.portion, 2.5);
                assert!(!args.summary);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_portion_defaults_to_one() {
        let cli = Cli::try_parse_from(["meal_prep", "adjust", "a.csv"]).unwrap();
        match cli.command {
            Command::Adjust(args) => assert_eq!(args.portion, 1.0),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_portion_out_of_range_is_rejected() {
        assert!(Cli::try_parse_from(["meal_prep", "adjust", "a.csv", "-p", "4"]).is_err());
        assert!(Cli::try_parse_from(["meal_prep", "adjust", "a.csv", "-p", "lots"]).is_err());
    }

    #[test]
    fn test_adjust_requires_a_file() {
        assert!(Cli::try_parse_from(["meal_prep", "adjust"]).is_err());
    }

    #[test]
    fn test_template_output() {
        let cli = Cli::try_parse_from(["meal_prep", "template", "-o", "t.csv"]).unwrap();
        assert!(matches!(cli.command, Command::Template { output: Some(p) } if p == PathBuf::from("t.csv")));
    }
}
