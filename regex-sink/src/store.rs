use async_trait::async_trait;
use thiserror::Error;

use crate::schema::{CatalogColumn, TableName};
use crate::types::SqlValue;

/// Enumeration of errors for operations against the backing store.
/// Errors can originate from sqlx and are wrapped by us to provide additional context.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("connection failed with: {error}")]
    Connection { error: sqlx::Error },
    #[error("{command} failed with: {error}")]
    Query {
        command: String,
        error: sqlx::Error,
    },
    #[error("a transaction is already open on this connection")]
    TransactionAlreadyOpen,
    #[error("no transaction is open on this connection")]
    NoTransaction,
    #[error("the store rejected the write: {0}")]
    Rejected(String),
}

/// The connection surface the sink needs: catalog reads, positional-parameter
/// writes, and explicit transaction scope. The handle is exclusively owned by
/// one batch at a time; that exclusivity is the caller's contract.
#[async_trait]
pub trait RowStore {
    /// Read the ordered column catalog for one table.
    async fn table_columns(&mut self, table: &TableName) -> Result<Vec<CatalogColumn>, StoreError>;

    async fn begin(&mut self) -> Result<(), StoreError>;

    /// Execute one parameterized single-row write.
    async fn execute(&mut self, statement: &str, params: &[SqlValue]) -> Result<(), StoreError>;

    async fn commit(&mut self) -> Result<(), StoreError>;

    async fn rollback(&mut self) -> Result<(), StoreError>;
}

/// An in-memory store that records statements, bound rows, and transaction
/// transitions. Useful for tests and dry runs; rows only become visible in
/// `committed_rows` once a transaction commits.
#[derive(Debug, Default)]
pub struct MemoryRowStore {
    columns: Vec<CatalogColumn>,
    committed: Vec<(String, Vec<SqlValue>)>,
    pending: Vec<(String, Vec<SqlValue>)>,
    in_transaction: bool,
    executed: usize,
    writes_before_failure: Option<usize>,
}

impl MemoryRowStore {
    pub fn new(columns: Vec<CatalogColumn>) -> Self {
        Self {
            columns,
            ..Default::default()
        }
    }

    /// Make every execute after the first `writes` fail, to exercise the
    /// batch abort path.
    pub fn fail_after(mut self, writes: usize) -> Self {
        self.writes_before_failure = Some(writes);
        self
    }

    pub fn committed_rows(&self) -> &[(String, Vec<SqlValue>)] {
        &self.committed
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn table_columns(&mut self, _table: &TableName) -> Result<Vec<CatalogColumn>, StoreError> {
        Ok(self.columns.clone())
    }

    async fn begin(&mut self) -> Result<(), StoreError> {
        if self.in_transaction {
            return Err(StoreError::TransactionAlreadyOpen);
        }
        self.in_transaction = true;
        self.pending.clear();
        Ok(())
    }

    async fn execute(&mut self, statement: &str, params: &[SqlValue]) -> Result<(), StoreError> {
        if !self.in_transaction {
            return Err(StoreError::NoTransaction);
        }
        if let Some(limit) = self.writes_before_failure {
            if self.executed >= limit {
                return Err(StoreError::Rejected("injected write failure".to_owned()));
            }
        }
        self.executed += 1;
        self.pending.push((statement.to_owned(), params.to_vec()));
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        if !self.in_transaction {
            return Err(StoreError::NoTransaction);
        }
        self.committed.append(&mut self.pending);
        self.in_transaction = false;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        if !self.in_transaction {
            return Err(StoreError::NoTransaction);
        }
        self.pending.clear();
        self.in_transaction = false;
        Ok(())
    }
}
