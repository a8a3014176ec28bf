use thiserror::Error;

use crate::store::StoreError;
use crate::types::CoerceError;

/// Enumeration of errors raised while building the immutable mapping
/// configuration. All of them are fatal: no sink is produced.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("at least one capture column must be configured")]
    NoColumns,
    #[error("column and header names cannot be blank")]
    BlankColumnName,
    #[error("invalid extraction pattern: {0}")]
    InvalidRegex(#[from] regex::Error),
    #[error("{0} is not a valid key generator, expected one of: timestamp, nanotimestamp, uuid, sequence")]
    UnknownKeyGenerator(String),
}

/// Enumeration of errors raised while resolving the target table at
/// initialization time. Fatal; initialization aborts and nothing is retried.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("table {table} has no columns in the catalog, does it exist?")]
    TableNotFound { table: String },
    #[error("column {column} was not found in table {table}")]
    ColumnNotFound { column: String, table: String },
    #[error("table {table} has no unqualified column to hold a generated key")]
    PrimaryKeyMissing { table: String },
    #[error("column {column} in table {table} has unsupported type {data_type}")]
    UnsupportedColumnType {
        column: String,
        table: String,
        data_type: String,
    },
    #[error("failed to read the table catalog")]
    Catalog(#[from] StoreError),
}

/// The single error a failed batch propagates to the caller. Exactly one is
/// produced per aborted batch; no rows from that batch are committed.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("failed to coerce value for column {column}: {source}")]
    Coercion {
        column: String,
        #[source]
        source: CoerceError,
    },
    #[error("failed to execute batch write: {0}")]
    Execution(#[from] StoreError),
}

/// Errors surfaced by `EventWriter::initialize`, covering both the mapping
/// configuration and the schema resolution phases.
#[derive(Error, Debug)]
pub enum InitError {
    #[error("invalid sink configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to resolve target table: {0}")]
    Schema(#[from] SchemaError),
}
