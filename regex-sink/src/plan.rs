use crate::config::MappingConfig;
use crate::error::SchemaError;
use crate::schema::{normalize, TableName, TableSchema};
use crate::types::SqlType;

/// One resolved column: its family-qualified name, the coercion selected for
/// it, and its position in the plan. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub qualified_name: String,
    pub sql_type: SqlType,
    pub ordinal: usize,
}

/// The ordered bind plan for one table: capture columns, then header columns,
/// then the optional generated-key column, with the parameterized upsert
/// statement rendered once for the table's lifetime.
#[derive(Debug, Clone)]
pub struct ColumnPlan {
    columns: Vec<ColumnDescriptor>,
    capture_count: usize,
    header_count: usize,
    statement: String,
}

impl ColumnPlan {
    /// Resolve every configured name against the table schema and render the
    /// write statement. Any unresolved name is fatal; no plan is produced.
    pub fn build(
        mapping: &MappingConfig,
        schema: &TableSchema,
        table: &TableName,
    ) -> Result<Self, SchemaError> {
        let mut columns = Vec::with_capacity(
            mapping.columns().len()
                + mapping.headers().len()
                + usize::from(mapping.key_generator().is_some()),
        );

        for name in mapping.columns().iter().chain(mapping.headers()) {
            let descriptor = resolve(&normalize(name), schema, table, columns.len())?;
            columns.push(descriptor);
        }

        if mapping.key_generator().is_some() {
            let rowkey = schema
                .rowkey_candidate()
                .ok_or_else(|| SchemaError::PrimaryKeyMissing {
                    table: table.to_string(),
                })?
                .to_owned();
            let descriptor = resolve(&rowkey, schema, table, columns.len())?;
            columns.push(descriptor);
        }

        let statement = render_statement(table, &columns, schema.rowkey_candidate());

        Ok(Self {
            capture_count: mapping.columns().len(),
            header_count: mapping.headers().len(),
            columns,
            statement,
        })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn capture_columns(&self) -> &[ColumnDescriptor] {
        &self.columns[..self.capture_count]
    }

    pub fn header_columns(&self) -> &[ColumnDescriptor] {
        &self.columns[self.capture_count..self.capture_count + self.header_count]
    }

    pub fn key_column(&self) -> Option<&ColumnDescriptor> {
        self.columns
            .get(self.capture_count + self.header_count)
    }
}

fn resolve(
    name: &str,
    schema: &TableSchema,
    table: &TableName,
    ordinal: usize,
) -> Result<ColumnDescriptor, SchemaError> {
    let data_type = schema
        .data_type(name)
        .ok_or_else(|| SchemaError::ColumnNotFound {
            column: name.to_owned(),
            table: table.to_string(),
        })?;

    let sql_type =
        SqlType::from_catalog(data_type).ok_or_else(|| SchemaError::UnsupportedColumnType {
            column: name.to_owned(),
            table: table.to_string(),
            data_type: data_type.to_owned(),
        })?;

    Ok(ColumnDescriptor {
        qualified_name: name.to_owned(),
        sql_type,
        ordinal,
    })
}

/// Render the single-row upsert: one positional placeholder per descriptor,
/// column order equal to plan order. When the row-key candidate is among the
/// written columns the insert upserts on it; otherwise a plain insert.
fn render_statement(
    table: &TableName,
    columns: &[ColumnDescriptor],
    rowkey: Option<&str>,
) -> String {
    let column_list = columns
        .iter()
        .map(|c| quote(&c.qualified_name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|i| format!("${i}"))
        .collect::<Vec<_>>()
        .join(", ");

    let insert = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_table(table),
        column_list,
        placeholders
    );

    let key = match rowkey {
        Some(key) if columns.iter().any(|c| c.qualified_name == key) => key,
        _ => return insert,
    };

    let updates = columns
        .iter()
        .filter(|c| c.qualified_name != key)
        .map(|c| format!("{0} = EXCLUDED.{0}", quote(&c.qualified_name)))
        .collect::<Vec<_>>()
        .join(", ");

    if updates.is_empty() {
        format!("{insert} ON CONFLICT ({}) DO NOTHING", quote(key))
    } else {
        format!(
            "{insert} ON CONFLICT ({}) DO UPDATE SET {updates}",
            quote(key)
        )
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn quote_table(table: &TableName) -> String {
    match table.schema() {
        Some(schema) => format!("{}.{}", quote(schema), quote(table.table())),
        None => quote(table.table()),
    }
}
