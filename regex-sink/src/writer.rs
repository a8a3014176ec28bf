use tracing::{debug, error, info};

use crate::config::MappingConfig;
use crate::error::{BatchError, InitError};
use crate::event::Event;
use crate::extract::{Extraction, PatternExtractor};
use crate::plan::{ColumnDescriptor, ColumnPlan};
use crate::schema::{resolve_table, TableName};
use crate::store::RowStore;
use crate::types::SqlValue;

/// What a committed batch looked like: rows written plus events dropped for
/// shape reasons. Skips never fail a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub written: usize,
    pub skipped: usize,
}

/// Writes batches of events into one table as single-row upserts under one
/// transaction per batch. Built once per table; per-batch work only reads it.
pub struct EventWriter {
    mapping: MappingConfig,
    extractor: PatternExtractor,
    plan: ColumnPlan,
    table: TableName,
}

impl EventWriter {
    /// Resolve the table schema and build the column plan and statement.
    /// Fails fatally on an unknown table, an unresolved configured column,
    /// or a requested key with no unqualified column to hold it.
    pub async fn initialize<S: RowStore>(
        store: &mut S,
        table_name: &str,
        mapping: MappingConfig,
    ) -> Result<Self, InitError> {
        let table = TableName::parse(table_name);
        let extractor = PatternExtractor::new(
            mapping.regex(),
            mapping.ignore_case(),
            mapping.columns().len(),
        )?;

        let schema = resolve_table(store, &table).await?;
        let plan = ColumnPlan::build(&mapping, &schema, &table)?;
        info!(table = %table, statement = plan.statement(), "prepared upsert statement");

        Ok(Self {
            mapping,
            extractor,
            plan,
            table,
        })
    }

    pub fn plan(&self) -> &ColumnPlan {
        &self.plan
    }

    /// Process one batch: extract, coerce, bind and write each event in input
    /// order, then commit once. Any coercion or store failure aborts the
    /// whole batch with an affirmative rollback and exactly one error.
    pub async fn write_batch<S: RowStore>(
        &self,
        store: &mut S,
        events: &[Event],
    ) -> Result<BatchSummary, BatchError> {
        store.begin().await?;

        match self.write_events(store, events).await {
            Ok(summary) => {
                store.commit().await?;
                metrics::counter!("regex_sink_rows_written_total")
                    .increment(summary.written as u64);
                info!(
                    table = %self.table,
                    written = summary.written,
                    skipped = summary.skipped,
                    "batch committed"
                );
                Ok(summary)
            }
            Err(batch_error) => {
                error!(table = %self.table, error = %batch_error, "aborting batch");
                if let Err(rollback_error) = store.rollback().await {
                    error!(error = %rollback_error, "rollback failed after batch error");
                }
                metrics::counter!("regex_sink_batches_aborted_total").increment(1);
                Err(batch_error)
            }
        }
    }

    async fn write_events<S: RowStore>(
        &self,
        store: &mut S,
        events: &[Event],
    ) -> Result<BatchSummary, BatchError> {
        let mut written = 0;
        let mut skipped = 0;

        for event in events {
            let values = match self.extractor.extract(event.payload()) {
                Extraction::Matched(values) => values,
                Extraction::Skipped(reason) => {
                    debug!(
                        payload = %String::from_utf8_lossy(event.payload()),
                        pattern = self.extractor.source(),
                        %reason,
                        "skipping event"
                    );
                    metrics::counter!("regex_sink_events_skipped_total").increment(1);
                    skipped += 1;
                    continue;
                }
            };

            let params = self.bind_event(&values, event)?;
            store.execute(self.plan.statement(), &params).await?;
            written += 1;
        }

        Ok(BatchSummary { written, skipped })
    }

    /// Coerce and order one event's values: captures, then headers, then the
    /// generated key, matching the plan and placeholder order exactly.
    fn bind_event(
        &self,
        values: &[Option<String>],
        event: &Event,
    ) -> Result<Vec<SqlValue>, BatchError> {
        let mut params = Vec::with_capacity(self.plan.len());

        for (descriptor, value) in self.plan.capture_columns().iter().zip(values) {
            params.push(coerce(descriptor, value.as_deref())?);
        }

        for (descriptor, header_name) in
            self.plan.header_columns().iter().zip(self.mapping.headers())
        {
            params.push(coerce(descriptor, event.header(header_name))?);
        }

        if let Some(descriptor) = self.plan.key_column() {
            if let Some(generator) = self.mapping.key_generator() {
                let key = generator.generate();
                params.push(coerce(descriptor, Some(&key))?);
            }
        }

        Ok(params)
    }
}

fn coerce(descriptor: &ColumnDescriptor, raw: Option<&str>) -> Result<SqlValue, BatchError> {
    descriptor
        .sql_type
        .coerce(raw)
        .map_err(|source| BatchError::Coercion {
            column: descriptor.qualified_name.clone(),
            source,
        })
}
