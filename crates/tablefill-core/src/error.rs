//! # Error Types
//!
//! Defines `TableFillError`, the unified error enum for every failure mode in
//! the tablefill pipeline. Variants carry the table, row index, SQL snippet or
//! sanitized connection URL involved so a failed task's `error` string is
//! actionable on its own.

use thiserror::Error;

/// All errors that can occur in tablefill operations.
#[derive(Error, Debug)]
pub enum TableFillError {
    #[error("{message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{message}")]
    ListResolution { message: String },

    #[error("No generator for {column_kind}:{kind}:{generator_type}")]
    GeneratorNotFound {
        column_kind: String,
        kind: String,
        generator_type: String,
    },

    #[error("{list} has no values")]
    EmptyList { list: String },

    #[error("Database connection failed: {message}\n  Connection: {connection_hint}\n  Cause: {source}")]
    Connection {
        message: String,
        connection_hint: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Schema introspection failed on query '{query}': {source}")]
    Introspection {
        query: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Insert failed on {table} at row {row_index}: {source}\n  SQL: {sql_preview}")]
    InsertFailed {
        table: String,
        row_index: usize,
        sql_preview: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Invalid CSV value list: {message}")]
    Csv { message: String },

    #[error("{0}")]
    Other(String),
}

impl TableFillError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        TableFillError::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn list_resolution(message: impl Into<String>) -> Self {
        TableFillError::ListResolution {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TableFillError>;
