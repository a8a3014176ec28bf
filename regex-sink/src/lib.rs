//! Ingest semi-structured text events into a SQL table.
//!
//! Fields are pulled out of each payload with a configured regular
//! expression, coerced to the table's column types, and written as
//! single-row upserts under one transaction per batch. Events that do not
//! match the configured shape are skipped; values that match but cannot be
//! coerced, or writes that fail, abort the whole batch.

pub mod config;
pub mod error;
pub mod event;
pub mod extract;
pub mod keygen;
pub mod plan;
pub mod schema;
pub mod store;
pub mod stores;
pub mod types;
pub mod writer;

pub use config::{Config, MappingConfig};
pub use error::{BatchError, ConfigError, InitError, SchemaError};
pub use event::Event;
pub use store::{MemoryRowStore, RowStore, StoreError};
pub use stores::postgres::PgRowStore;
pub use writer::{BatchSummary, EventWriter};
