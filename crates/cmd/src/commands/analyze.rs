use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use diagnostics::*;
use engine::DataFusionDatabase;
use pipeline::{Dimension, Pipeline, analyze_files, draw_report};

use crate::common::{OutputFormat, load_config, source_files};
use crate::output::sink_for;

#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub files: Vec<PathBuf>,
    /// Overrides the configured dimensions when non-empty
    pub dimensions: Vec<Dimension>,
    pub format: OutputFormat,
    /// Rows shown per result set
    pub limit: Option<usize>,
    /// Also show monthly counts rolled up from the day breakdown
    pub monthly: bool,
    pub config: Option<PathBuf>,
}

/// Register the files, run every requested aggregation and write the results
pub async fn analyze_command<W: Write>(options: &AnalyzeOptions, out: W) -> Result<()> {
    let mut config = load_config(options.config.as_deref()).await?;
    if !options.dimensions.is_empty() {
        config.dimensions = options.dimensions.clone();
    }
    if options.monthly && !config.dimensions.contains(&Dimension::Day) {
        debug!("Adding day dimension for the monthly rollup");
        config.dimensions.push(Dimension::Day);
    }
    config.validate()?;

    let files = source_files(&options.files)?;
    let db = DataFusionDatabase::with_options(config.engine.clone());
    let pipeline = Pipeline::new(config);

    let report = analyze_files(&db, &pipeline, &files).await?;

    let mut sink = sink_for(options.format, out);
    draw_report(&report, sink.as_mut(), options.limit)?;
    if options.monthly {
        let monthly = report.monthly().unwrap_or_default();
        sink.draw("monthly", &monthly)?;
    }
    Ok(())
}
