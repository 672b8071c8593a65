pub mod cache;
pub mod column_mapping;
pub mod reconciler;

pub use cache::ReconcileCache;
pub use column_mapping::{find_matching_column, normalize_column_name, CanonicalField, DescriptiveField};
pub use reconciler::{
    reconcile, reconcile_bytes, CanonicalRow, CanonicalTable, ColumnSource, FieldResolution,
    ReconciledRecipe, Reconciliation, RejectedUpload,
};
