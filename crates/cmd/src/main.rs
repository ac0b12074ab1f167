use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use cmd::OutputFormat;
use cmd::commands::{AnalyzeOptions, analyze_command, classify_command, count_command, sql_command};
use diagnostics::*;
use pipeline::Dimension;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "geotally")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Log rendered SQL and engine activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load CSV / Parquet files and run the aggregations
    Analyze(AnalyzeArgs),
    /// Count rows across files
    Count {
        /// Files to load (.csv, .tsv, .txt, .parquet, .pq)
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// YAML pipeline configuration
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Classify one coordinate pair into a continent
    Classify {
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        lon: Option<f64>,
    },
    /// Print the SQL an aggregation runs over the given table names
    Sql {
        /// year, day, hour_weekday, payment_type or continent
        #[arg(short, long)]
        dimension: Dimension,
        #[arg(required = true)]
        tables: Vec<String>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Files to load (.csv, .tsv, .txt, .parquet, .pq)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Aggregation to run; repeat for several (default: from config)
    #[arg(short, long = "dimension")]
    dimensions: Vec<Dimension>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Show at most this many rows per result
    #[arg(short, long)]
    limit: Option<usize>,

    /// Also show monthly counts derived from the day breakdown
    #[arg(long)]
    monthly: bool,

    /// YAML pipeline configuration
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        diagnostics::init_with_level(LogLevel::Debug);
    } else {
        diagnostics::init();
    }
    let out = std::io::stdout().lock();

    let result = match cli.command {
        Commands::Analyze(args) => {
            let options = AnalyzeOptions {
                files: args.files,
                dimensions: args.dimensions,
                format: args.format,
                limit: args.limit,
                monthly: args.monthly,
                config: args.config,
            };
            analyze_command(&options, out).await
        }
        Commands::Count { files, config } => count_command(&files, config.as_deref(), out).await,
        Commands::Classify { lat, lon } => classify_command(lat, lon, out),
        Commands::Sql {
            dimension,
            tables,
            config,
        } => sql_command(dimension, &tables, config.as_deref(), out).await,
    };

    if let Err(e) = &result {
        let message = format!("{e:#}");
        error!("Command failed: {message}", message: &message);
    }
    result
}
