//! Engine - the queryable-table collaborator behind geotally
//!
//! Defines the [`Database`] / [`Connection`] interface the pipeline is written
//! against, a [`Session`] guard that scopes one connection, and an in-process
//! implementation on DataFusion that decodes CSV and Parquet buffers into
//! in-memory tables.

// Interface shared by every engine implementation
pub mod connection;

// Scoped connection ownership
pub mod session;

// Buffer decoders
pub mod csv;
pub mod parquet_buffer;

// DataFusion-backed implementation
pub mod embedded;

pub mod error;

pub use connection::{Connection, Database, FileFormat, TableContent};
pub use csv::CsvOptions;
pub use embedded::{DataFusionConnection, DataFusionDatabase, EngineOptions};
pub use error::{EngineError, Result};
pub use session::Session;

// Re-exported so callers can name batch types without a direct arrow dependency
pub use arrow::record_batch::RecordBatch;
