pub mod enrich;
pub mod field;
pub mod ids;
pub mod registry;
pub mod value;
