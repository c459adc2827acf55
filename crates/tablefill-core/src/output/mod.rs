pub mod direct;
pub mod sql;
