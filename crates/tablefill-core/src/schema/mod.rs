pub mod mysql;
pub mod types;
