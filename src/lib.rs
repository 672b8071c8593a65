pub mod adjust;
pub mod cli;
pub mod error;
pub mod ingredient;
pub mod preview;
pub mod recipe_export;
pub mod recipe_loader;
pub mod reconcile;
