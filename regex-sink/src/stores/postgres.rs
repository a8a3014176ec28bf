use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgConnection;
use sqlx::{Connection, Executor};
use tracing::info;
use uuid::Uuid;

use crate::schema::{CatalogColumn, TableName};
use crate::store::{RowStore, StoreError};
use crate::types::{SqlType, SqlValue};

const CATALOG_QUERY: &str = r#"
SELECT
    column_name AS name,
    data_type,
    ordinal_position AS ordinal
FROM
    information_schema.columns
WHERE
    table_schema = $1
    AND table_name = $2
ORDER BY
    ordinal_position
"#;

/// A `RowStore` over one exclusively-owned PostgreSQL connection.
/// Transaction scope is driven explicitly with BEGIN/COMMIT/ROLLBACK
/// round-trips; outside a batch the connection is back in auto-commit.
pub struct PgRowStore {
    connection: PgConnection,
}

impl PgRowStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        info!("connecting to the store...");
        let connection = PgConnection::connect(url)
            .await
            .map_err(|error| StoreError::Connection { error })?;
        info!("connected to the store");

        Ok(Self { connection })
    }

    async fn run(&mut self, command: &str) -> Result<(), StoreError> {
        self.connection
            .execute(command)
            .await
            .map(|_| ())
            .map_err(|error| StoreError::Query {
                command: command.to_owned(),
                error,
            })
    }
}

#[async_trait]
impl RowStore for PgRowStore {
    async fn table_columns(&mut self, table: &TableName) -> Result<Vec<CatalogColumn>, StoreError> {
        sqlx::query_as::<_, CatalogColumn>(CATALOG_QUERY)
            .bind(table.schema().unwrap_or("public"))
            .bind(table.table())
            .fetch_all(&mut self.connection)
            .await
            .map_err(|error| StoreError::Query {
                command: "SELECT".to_owned(),
                error,
            })
    }

    async fn begin(&mut self) -> Result<(), StoreError> {
        self.run("BEGIN").await
    }

    async fn execute(&mut self, statement: &str, params: &[SqlValue]) -> Result<(), StoreError> {
        let mut query = sqlx::query(statement);
        for value in params {
            query = match value {
                SqlValue::Null(SqlType::Integer) => query.bind(None::<i64>),
                SqlValue::Null(SqlType::Double) => query.bind(None::<f64>),
                SqlValue::Null(SqlType::Text) => query.bind(None::<String>),
                SqlValue::Null(SqlType::Boolean) => query.bind(None::<bool>),
                SqlValue::Null(SqlType::Timestamp) => query.bind(None::<DateTime<Utc>>),
                SqlValue::Null(SqlType::Uuid) => query.bind(None::<Uuid>),
                SqlValue::Integer(v) => query.bind(*v),
                SqlValue::Double(v) => query.bind(*v),
                SqlValue::Text(v) => query.bind(v.clone()),
                SqlValue::Boolean(v) => query.bind(*v),
                SqlValue::Timestamp(v) => query.bind(*v),
                SqlValue::Uuid(v) => query.bind(*v),
            };
        }

        query
            .execute(&mut self.connection)
            .await
            .map(|_| ())
            .map_err(|error| StoreError::Query {
                command: "INSERT".to_owned(),
                error,
            })
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        self.run("COMMIT").await
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.run("ROLLBACK").await
    }
}
