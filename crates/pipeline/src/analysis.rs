//! Analysis runner
//!
//! Runs the configured aggregations against tables registered on one
//! [`Session`], one query at a time, and gathers the normalized rows into an
//! [`AnalysisReport`].

use crate::config::PipelineConfig;
use crate::dimension::Dimension;
use crate::error::{Error, Result};
use crate::ingest::{SourceFile, register_files};
use crate::rollup::rollup_monthly;
use crate::rows::{Row, rows_from_batches};
use crate::sql::{render_count, render_query};
use diagnostics::*;
use engine::{Database, EngineError, Session};
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Clone, Serialize)]
pub struct DimensionResult {
    pub dimension: Dimension,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisReport {
    /// Registered table names, in input order
    pub tables: Vec<String>,
    pub results: Vec<DimensionResult>,
}

impl AnalysisReport {
    #[must_use]
    pub fn get(&self, dimension: Dimension) -> Option<&[Row]> {
        self.results
            .iter()
            .find(|r| r.dimension == dimension)
            .map(|r| r.rows.as_slice())
    }

    /// Monthly counts rolled up from the `day` result, if it was run
    #[must_use]
    pub fn monthly(&self) -> Option<Vec<Row>> {
        self.get(Dimension::Day).map(rollup_monthly)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn render(&self, dimension: Dimension, tables: &[String]) -> Result<String> {
        render_query(dimension, tables, &self.config.columns)
    }

    /// Run one aggregation over `tables`
    pub async fn aggregate(
        &self,
        session: &mut Session,
        tables: &[String],
        dimension: Dimension,
    ) -> Result<Vec<Row>> {
        let sql = self.render(dimension, tables)?;
        let name = dimension.name();
        debug!("Aggregating by {name}: {sql}", name: name, sql: &sql);

        let started = Instant::now();
        let batches = session.query(&sql).await?;
        let rows = rows_from_batches(&batches)?;

        let row_count = rows.len();
        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            "Aggregated by {name}: {row_count} rows in {elapsed_ms}ms",
            name: name,
            row_count: row_count,
            elapsed_ms: elapsed_ms
        );
        Ok(rows)
    }

    /// Run every configured dimension in order
    pub async fn run(&self, session: &mut Session, tables: &[String]) -> Result<AnalysisReport> {
        let mut results = Vec::with_capacity(self.config.dimensions.len());
        for dimension in &self.config.dimensions {
            let rows = self.aggregate(session, tables, *dimension).await?;
            results.push(DimensionResult {
                dimension: *dimension,
                rows,
            });
        }
        Ok(AnalysisReport {
            tables: tables.to_vec(),
            results,
        })
    }

    /// Total number of rows across `tables`
    pub async fn count_rows(&self, session: &mut Session, tables: &[String]) -> Result<u64> {
        let sql = render_count(tables)?;
        let batches = session.query(&sql).await?;
        let rows = rows_from_batches(&batches)?;
        let count = rows
            .first()
            .and_then(|row| row.number("rows"))
            .ok_or_else(|| EngineError::query("row count query returned no rows"))?;
        Ok(count as u64)
    }
}

/// Register `files` and run every configured dimension on one session,
/// releasing the connection whatever the outcome
pub async fn analyze_files(
    db: &dyn Database,
    pipeline: &Pipeline,
    files: &[SourceFile],
) -> Result<AnalysisReport> {
    if files.is_empty() {
        return Err(Error::NoFiles);
    }
    let mut session = Session::open(db).await?;
    let result = async {
        let tables = register_files(&mut session, files).await?;
        pipeline.run(&mut session, &tables).await
    }
    .await;
    session.finish(result).await
}

/// Register `files` and count their rows on one session
pub async fn count_file_rows(
    db: &dyn Database,
    pipeline: &Pipeline,
    files: &[SourceFile],
) -> Result<u64> {
    if files.is_empty() {
        return Err(Error::NoFiles);
    }
    let mut session = Session::open(db).await?;
    let result = async {
        let tables = register_files(&mut session, files).await?;
        pipeline.count_rows(&mut session, &tables).await
    }
    .await;
    session.finish(result).await
}
