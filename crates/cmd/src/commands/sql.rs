use std::io::Write;
use std::path::Path;

use anyhow::Result;
use pipeline::{Dimension, Pipeline};

use crate::common::load_config;

/// Print the aggregation query that `analyze` would run over `tables`
pub async fn sql_command<W: Write>(
    dimension: Dimension,
    tables: &[String],
    config: Option<&Path>,
    mut out: W,
) -> Result<()> {
    let pipeline = Pipeline::new(load_config(config).await?);
    let sql = pipeline.render(dimension, tables)?;
    writeln!(out, "{sql}")?;
    Ok(())
}
