pub mod columns;
pub mod delimited;
pub mod table;
pub mod values;

// Re-export the pieces the engine and the binary reach for
pub use columns::{SurveyColumns, UniverseColumns};
pub use delimited::read_table;
pub use table::Table;
pub use values::{parse_quantity, parse_score};
