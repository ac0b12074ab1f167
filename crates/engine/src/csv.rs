//! CSV decoding
//!
//! Decodes a complete CSV buffer into Arrow batches with arrow_csv.
//! The delimiter is sniffed from the header line unless configured.

use crate::{EngineError, Result};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use arrow_csv::reader::Format;
use bytes::Bytes;
use diagnostics::*;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::sync::Arc;

/// Delimiters considered by [`sniff_delimiter`], in tie-break order
pub const DELIMITER_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// CSV decoding options
///
/// Based on arrow_csv::reader::Format. All fields have defaults so a config
/// file only needs to name what it changes.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CsvOptions {
    /// Field delimiter; sniffed from the header line when absent
    #[serde(default)]
    pub delimiter: Option<char>,

    /// Whether the file has a header row (default: true)
    #[serde(default = "default_has_header")]
    pub has_header: bool,

    /// Quote character (default: '"')
    #[serde(default = "default_quote")]
    pub quote: char,

    /// Number of rows sampled for schema inference (default: 1000)
    #[serde(default = "default_schema_infer_max_records")]
    pub schema_infer_max_records: usize,
}

fn default_has_header() -> bool {
    true
}
fn default_quote() -> char {
    '"'
}
fn default_schema_infer_max_records() -> usize {
    1000
}

impl CsvOptions {
    /// The configured delimiter as a single byte, if one is set
    pub fn delimiter_byte(&self) -> Result<Option<u8>> {
        self.delimiter
            .map(|d| ascii_byte("delimiter", d))
            .transpose()
    }

    pub fn quote_byte(&self) -> Result<u8> {
        ascii_byte("quote", self.quote)
    }

    /// Reject delimiter and quote characters that do not fit in one byte
    pub fn validate(&self) -> Result<()> {
        self.delimiter_byte()?;
        self.quote_byte()?;
        Ok(())
    }
}

fn ascii_byte(option: &str, c: char) -> Result<u8> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(EngineError::CsvOption {
            message: format!("{option} '{c}' is not an ASCII character"),
        })
    }
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: default_has_header(),
            quote: default_quote(),
            schema_infer_max_records: default_schema_infer_max_records(),
        }
    }
}

/// Pick the most frequent candidate delimiter on the first line, ignoring
/// anything inside quotes. Falls back to ','.
#[must_use]
pub fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or_default();

    let mut counts = [0usize; DELIMITER_CANDIDATES.len()];
    let mut quoted = false;
    for byte in first_line {
        if *byte == b'"' {
            quoted = !quoted;
            continue;
        }
        if quoted {
            continue;
        }
        if let Some(idx) = DELIMITER_CANDIDATES.iter().position(|c| c == byte) {
            counts[idx] += 1;
        }
    }

    let mut best = 0;
    for idx in 1..counts.len() {
        if counts[idx] > counts[best] {
            best = idx;
        }
    }
    if counts[best] == 0 {
        b','
    } else {
        DELIMITER_CANDIDATES[best]
    }
}

/// Replace inferred date, time and timestamp columns with `Utf8`.
///
/// Inference only samples the leading rows, so a malformed value further down
/// would otherwise fail the whole decode. Temporal text is parsed in SQL.
fn temporal_as_text(schema: &Schema) -> Schema {
    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|field| match field.data_type() {
            DataType::Timestamp(_, _)
            | DataType::Date32
            | DataType::Date64
            | DataType::Time32(_)
            | DataType::Time64(_) => field.as_ref().clone().with_data_type(DataType::Utf8),
            _ => field.as_ref().clone(),
        })
        .collect();
    Schema::new_with_metadata(fields, schema.metadata().clone())
}

/// Decode a complete CSV buffer into its inferred schema and batches
pub fn read_csv(
    bytes: Bytes,
    options: &CsvOptions,
    batch_size: usize,
) -> Result<(SchemaRef, Vec<RecordBatch>)> {
    let bytes = if bytes.starts_with(UTF8_BOM) {
        bytes.slice(UTF8_BOM.len()..)
    } else {
        bytes
    };

    let delimiter = match options.delimiter_byte()? {
        Some(d) => d,
        None => sniff_delimiter(&bytes),
    };
    let quote = options.quote_byte()?;
    let shown = (delimiter as char).escape_default().to_string();
    debug!("Decoding CSV with delimiter '{shown}'", shown: &shown);

    let format = Format::default()
        .with_delimiter(delimiter)
        .with_header(options.has_header)
        .with_quote(quote);

    let (schema, _) = format.infer_schema(
        Cursor::new(bytes.as_ref()),
        Some(options.schema_infer_max_records),
    )?;
    let schema = Arc::new(temporal_as_text(&schema));

    let reader = arrow_csv::ReaderBuilder::new(schema.clone())
        .with_delimiter(delimiter)
        .with_header(options.has_header)
        .with_quote(quote)
        .with_batch_size(batch_size)
        .build(Cursor::new(bytes))?;

    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((schema, batches))
}
