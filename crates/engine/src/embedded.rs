//! In-process analytical database backed by DataFusion
//!
//! Registered tables are decoded eagerly into `MemTable`s held by one shared
//! `SessionContext`, so every connection from the same database sees the
//! same tables. Connections are cheap handles onto that context.

use crate::csv::{CsvOptions, read_csv};
use crate::parquet_buffer::read_parquet;
use crate::{Connection, Database, EngineError, Result, TableContent};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use datafusion::catalog::{CatalogProvider, SchemaProvider};
use datafusion::datasource::MemTable;
use datafusion::execution::context::SessionContext;
use datafusion::sql::TableReference;
use diagnostics::*;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Options applied when decoding registered content
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineOptions {
    #[serde(default)]
    pub csv: CsvOptions,

    /// Rows per decoded batch (default: 8192)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    8192
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            csv: CsvOptions::default(),
            batch_size: default_batch_size(),
        }
    }
}

pub struct DataFusionDatabase {
    ctx: SessionContext,
    options: EngineOptions,
    open: Arc<AtomicUsize>,
}

impl DataFusionDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    #[must_use]
    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            ctx: SessionContext::new(),
            options,
            open: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of connections handed out and not yet released
    #[must_use]
    pub fn open_connections(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Names of all registered tables, sorted
    #[must_use]
    pub fn table_names(&self) -> Vec<String> {
        let mut names = self
            .ctx
            .catalog("datafusion")
            .and_then(|catalog| catalog.schema("public"))
            .map(|schema| schema.table_names())
            .unwrap_or_default();
        names.sort();
        names
    }
}

impl Default for DataFusionDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Database for DataFusionDatabase {
    async fn connect(&self) -> Result<Box<dyn Connection>> {
        let open = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("DataFusion connection acquired ({open} open)", open: open);
        Ok(Box::new(DataFusionConnection {
            ctx: Some(self.ctx.clone()),
            options: self.options.clone(),
            open: self.open.clone(),
        }))
    }
}

pub struct DataFusionConnection {
    /// None once closed
    ctx: Option<SessionContext>,
    options: EngineOptions,
    open: Arc<AtomicUsize>,
}

impl DataFusionConnection {
    fn ctx(&self) -> Result<&SessionContext> {
        self.ctx.as_ref().ok_or(EngineError::ConnectionClosed)
    }

    fn release(&mut self) {
        if self.ctx.take().is_some() {
            let open = self.open.fetch_sub(1, Ordering::SeqCst) - 1;
            debug!("DataFusion connection released ({open} open)", open: open);
        }
    }
}

#[async_trait]
impl Connection for DataFusionConnection {
    async fn register_table(&mut self, name: &str, content: TableContent) -> Result<()> {
        let ctx = self.ctx()?;
        let format = content.format().as_str();
        let size = content.len();

        let (schema, batches) = match content {
            TableContent::Csv(bytes) => read_csv(bytes, &self.options.csv, self.options.batch_size)?,
            TableContent::Parquet(bytes) => read_parquet(bytes, self.options.batch_size)?,
        };
        let rows: usize = batches.iter().map(|b| b.num_rows()).sum();

        let table = MemTable::try_new(schema, vec![batches])
            .map_err(|e| EngineError::registration(name, e.to_string()))?;

        let reference = TableReference::bare(name);
        if ctx.table_exist(reference.clone())? {
            debug!("Replacing existing table '{name}'", name: name);
            ctx.deregister_table(reference.clone())?;
        }
        ctx.register_table(reference, Arc::new(table))
            .map_err(|e| EngineError::registration(name, e.to_string()))?;

        info!(
            "Registered {format} table '{name}': {size} bytes, {rows} rows",
            format: format,
            name: name,
            size: size,
            rows: rows
        );
        Ok(())
    }

    async fn query(&mut self, sql: &str) -> Result<Vec<RecordBatch>> {
        let ctx = self.ctx()?;
        debug!("Executing SQL query: {sql}", sql: sql);

        let df = ctx.sql(sql).await?;
        let mut stream = df.execute_stream().await?;

        let mut batches = Vec::new();
        while let Some(batch) = stream.next().await {
            batches.push(batch?);
        }

        let batch_count = batches.len();
        let total_rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        debug!(
            "Query completed: {batch_count} batches, {total_rows} total rows",
            batch_count: batch_count,
            total_rows: total_rows
        );
        Ok(batches)
    }

    async fn close(&mut self) -> Result<()> {
        self.release();
        Ok(())
    }
}

impl Drop for DataFusionConnection {
    fn drop(&mut self) {
        self.release();
    }
}
