//! Queryable-table collaborator interface
//!
//! The pipeline never talks to DataFusion directly. It sees a [`Database`]
//! that hands out [`Connection`]s, and a connection that can register raw
//! file content under a name and answer SQL with Arrow batches.

use crate::Result;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported raw file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Parquet,
}

impl FileFormat {
    /// Map a file extension (without the dot, any case) to a format
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" | "tsv" | "txt" => Some(FileFormat::Csv),
            "parquet" | "pq" => Some(FileFormat::Parquet),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Parquet => "parquet",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete in-memory contents of one file, tagged with its format
#[derive(Debug, Clone)]
pub enum TableContent {
    Csv(Bytes),
    Parquet(Bytes),
}

impl TableContent {
    pub fn new(format: FileFormat, bytes: impl Into<Bytes>) -> Self {
        match format {
            FileFormat::Csv => TableContent::Csv(bytes.into()),
            FileFormat::Parquet => TableContent::Parquet(bytes.into()),
        }
    }

    #[must_use]
    pub fn format(&self) -> FileFormat {
        match self {
            TableContent::Csv(_) => FileFormat::Csv,
            TableContent::Parquet(_) => FileFormat::Parquet,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            TableContent::Csv(b) | TableContent::Parquet(b) => b.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An analytical database that hands out connections
#[async_trait]
pub trait Database: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Connection>>;
}

/// One connection to a [`Database`]
///
/// Every method takes `&mut self`: a connection serves one caller at a time,
/// and operations on it are issued strictly in sequence.
#[async_trait]
pub trait Connection: Send {
    /// Register `content` as a queryable table called `name`.
    /// An existing table with the same name is replaced.
    async fn register_table(&mut self, name: &str, content: TableContent) -> Result<()>;

    /// Run one SQL statement and collect every result batch
    async fn query(&mut self, sql: &str) -> Result<Vec<RecordBatch>>;

    /// Release the connection. Later calls fail with `ConnectionClosed`.
    async fn close(&mut self) -> Result<()>;
}
