//! Pipeline - classification and aggregation over registered trip data
//!
//! Files are registered with the engine by the ingestion adapter
//! ([`register_files`]); the [`Pipeline`] then runs one SQL aggregation per
//! [`Dimension`] and returns normalized [`Row`]s. The same dimension table
//! drives an in-memory implementation ([`aggregate`]) over [`RawRecord`]s.

// Classification and parsing
pub mod continent;
pub mod timestamp;

// Aggregation model
pub mod dimension;
pub mod record;
pub mod rows;

// In-memory path
pub mod aggregate;
pub mod rollup;

// Engine path
pub mod analysis;
pub mod ingest;
pub mod sql;

pub mod config;
pub mod error;
pub mod sink;

pub use aggregate::{
    aggregate, aggregate_by_continent, aggregate_by_day, aggregate_by_hour_and_weekday,
    aggregate_by_payment_type, aggregate_by_year,
};
pub use analysis::{AnalysisReport, DimensionResult, Pipeline, analyze_files, count_file_rows};
pub use config::{ColumnMap, PipelineConfig};
pub use continent::{Continent, classify};
pub use dimension::Dimension;
pub use error::{Error, Result};
pub use ingest::{FileOrigin, SourceFile, register_files};
pub use record::RawRecord;
pub use rollup::rollup_monthly;
pub use rows::{Row, Value, rows_from_batches, rows_to_batch};
pub use sink::{ReportSink, draw_report};
pub use timestamp::parse_timestamp;
