//! Storage-layout migration.
//!
//! There is no schema-version flag: the migrator inspects the tree and moves
//! whatever is still in a legacy place. It runs before every bulk load.

mod layout;
mod report;

pub use layout::LayoutMigrator;
pub use report::MigrationReport;
