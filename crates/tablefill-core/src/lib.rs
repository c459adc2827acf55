pub mod catalog;
pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod schema;
pub mod task;

// Re-export key types for convenience
pub use error::{Result, TableFillError};
pub use generate::field::{FieldConfig, GenerationInput};
pub use schema::types::{ColumnInfo, ColumnKind, ValueKind};
pub use task::driver::InsertDriver;
