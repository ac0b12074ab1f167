use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use diagnostics::*;
use pipeline::{PipelineConfig, SourceFile};

/// How result rows are written
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned text tables (default)
    #[default]
    Table,
    /// One JSON object per result set, one per line
    Json,
    /// CSV with a header row per result set
    Csv,
}

/// Read the configuration file if one was given, otherwise use defaults
pub async fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            let display = path.display().to_string();
            debug!("Loading config from {display}", display: &display);
            PipelineConfig::load(path)
                .await
                .with_context(|| format!("Failed to load config {display}"))
        }
        None => Ok(PipelineConfig::default()),
    }
}

/// Turn command-line paths into source files, in the order given
pub fn source_files(paths: &[PathBuf]) -> Result<Vec<SourceFile>> {
    paths
        .iter()
        .map(|path| SourceFile::from_path(path).map_err(anyhow::Error::from))
        .collect()
}
