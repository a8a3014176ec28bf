//! Feed newline-delimited records from stdin into the configured table.
//!
//! This is the minimal embedding caller; real deployments drive the writer
//! from their own delivery pipeline.
use envconfig::Envconfig;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use regex_sink::config::Config;
use regex_sink::event::Event;
use regex_sink::stores::postgres::PgRowStore;
use regex_sink::writer::EventWriter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::init_from_env().expect("Invalid configuration:");
    let mapping = config.mapping()?;

    let mut store = PgRowStore::connect(&config.database_url).await?;
    let writer = EventWriter::initialize(&mut store, &config.table_name, mapping).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut batch = Vec::with_capacity(config.batch_size);

    while let Some(line) = lines.next_line().await? {
        batch.push(Event::new(line));
        if batch.len() >= config.batch_size {
            writer.write_batch(&mut store, &batch).await?;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        writer.write_batch(&mut store, &batch).await?;
    }

    info!("stdin closed, all batches committed");
    Ok(())
}
