use std::fmt;

use crate::error::SchemaError;
use crate::store::RowStore;

/// A possibly schema-qualified table name, normalized to the store's
/// lower-case identifier convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    schema: Option<String>,
    table: String,
}

impl TableName {
    /// Split `schema.table` on the first dot; a bare name has no schema.
    pub fn parse(full: &str) -> Self {
        match full.split_once('.') {
            Some((schema, table)) => Self {
                schema: Some(normalize(schema)),
                table: normalize(table),
            },
            None => Self {
                schema: None,
                table: normalize(full),
            },
        }
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.table),
            None => write!(f, "{}", self.table),
        }
    }
}

/// Normalize an identifier the way the store folds unquoted names.
pub fn normalize(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

/// One column as read from the store catalog. The name carries the family
/// qualifier in dotted `family.column` form; a name with no dot marks the
/// row-key candidate.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CatalogColumn {
    pub name: String,
    pub data_type: String,
    pub ordinal: i32,
}

/// The resolved table: every column in catalog order plus the row-key
/// candidate, if any. Built once when the table is opened, read-only after.
#[derive(Debug, Clone)]
pub struct TableSchema {
    columns: Vec<CatalogColumn>,
    rowkey: Option<String>,
}

impl TableSchema {
    pub(crate) fn from_columns(
        columns: Vec<CatalogColumn>,
        table: &TableName,
    ) -> Result<Self, SchemaError> {
        if columns.is_empty() {
            return Err(SchemaError::TableNotFound {
                table: table.to_string(),
            });
        }

        let rowkey = columns
            .iter()
            .filter(|column| !column.name.contains('.'))
            .next_back()
            .map(|column| column.name.clone());

        Ok(Self { columns, rowkey })
    }

    pub fn columns(&self) -> &[CatalogColumn] {
        &self.columns
    }

    pub fn data_type(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .map(|column| column.data_type.as_str())
    }

    /// The unqualified column that can hold a generated key.
    pub fn rowkey_candidate(&self) -> Option<&str> {
        self.rowkey.as_deref()
    }
}

/// Read one table's catalog through the store. Zero columns means the table
/// does not exist as far as the sink is concerned.
pub async fn resolve_table<S: RowStore>(
    store: &mut S,
    table: &TableName,
) -> Result<TableSchema, SchemaError> {
    let columns = store
        .table_columns(table)
        .await
        .map_err(SchemaError::Catalog)?;

    TableSchema::from_columns(columns, table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRowStore;

    fn column(name: &str, data_type: &str, ordinal: i32) -> CatalogColumn {
        CatalogColumn {
            name: name.to_owned(),
            data_type: data_type.to_owned(),
            ordinal,
        }
    }

    #[test]
    fn test_table_name_parsing() {
        let qualified = TableName::parse("Analytics.Web_Logs");
        assert_eq!(qualified.schema(), Some("analytics"));
        assert_eq!(qualified.table(), "web_logs");
        assert_eq!(qualified.to_string(), "analytics.web_logs");

        let bare = TableName::parse("web_logs");
        assert_eq!(bare.schema(), None);
        assert_eq!(bare.to_string(), "web_logs");
    }

    #[test]
    fn test_rowkey_candidate_is_the_unqualified_column() {
        let schema = TableSchema::from_columns(
            vec![
                column("cf.a", "integer", 1),
                column("cf.b", "text", 2),
                column("id", "text", 3),
            ],
            &TableName::parse("t"),
        )
        .unwrap();

        assert_eq!(schema.rowkey_candidate(), Some("id"));
        assert_eq!(schema.data_type("cf.a"), Some("integer"));
        assert_eq!(schema.data_type("missing"), None);
    }

    #[test]
    fn test_fully_qualified_table_has_no_rowkey_candidate() {
        let schema = TableSchema::from_columns(
            vec![column("cf.a", "integer", 1), column("cf.b", "text", 2)],
            &TableName::parse("t"),
        )
        .unwrap();

        assert_eq!(schema.rowkey_candidate(), None);
    }

    #[tokio::test]
    async fn test_empty_catalog_is_table_not_found() {
        let mut store = MemoryRowStore::new(vec![]);

        let result = resolve_table(&mut store, &TableName::parse("nope.missing")).await;

        match result {
            Err(SchemaError::TableNotFound { table }) => assert_eq!(table, "nope.missing"),
            other => panic!("expected TableNotFound, got {other:?}"),
        }
    }
}
