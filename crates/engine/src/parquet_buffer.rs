// Parquet decoding from a complete in-memory buffer

use crate::Result;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

/// Decode a whole Parquet file held in memory into its schema and batches
pub fn read_parquet(bytes: Bytes, batch_size: usize) -> Result<(SchemaRef, Vec<RecordBatch>)> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(bytes)?.with_batch_size(batch_size);
    let schema = builder.schema().clone();
    let reader = builder.build()?;

    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((schema, batches))
}
