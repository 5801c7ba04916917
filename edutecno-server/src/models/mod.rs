//! Domain models with validation at construction

pub mod table;
pub mod validation;

pub use table::TableName;
pub use validation::ValidationError;
