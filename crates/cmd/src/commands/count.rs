use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use engine::DataFusionDatabase;
use pipeline::{Pipeline, count_file_rows};

use crate::common::{load_config, source_files};

/// Print the total number of rows across all files
pub async fn count_command<W: Write>(paths: &[PathBuf], config: Option<&Path>, mut out: W) -> Result<()> {
    let config = load_config(config).await?;
    let files = source_files(paths)?;
    let db = DataFusionDatabase::with_options(config.engine.clone());
    let pipeline = Pipeline::new(config);

    let rows = count_file_rows(&db, &pipeline, &files).await?;
    writeln!(out, "{rows}")?;
    Ok(())
}
