//! CLI command tests against files in a temporary directory

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use cmd::OutputFormat;
use cmd::commands::{AnalyzeOptions, analyze_command, count_command};
use pipeline::Dimension;
use tempfile::tempdir;

const TRIPS: &str = "\
tpep_pickup_datetime,latitude,longitude,payment_type,fare_amount,tip_amount,total_amount,trip_distance
2019-03-01T08:00:00,40.7,-74.0,1,10.0,2.0,12.0,1.5
2019-03-01T09:30:00,40.8,-73.9,2,14.0,0.0,14.0,2.5
\"03/02/2019,18:15:00\",48.8,2.3,1,20.0,4.0,24.0,4.0
not-a-date,-33.9,151.2,1,9.0,1.0,10.0,1.0
2019-04-10T07:00:00,,,3,5.0,0.0,0.0,0.0
";

fn write_trips(dir: &Path) -> Result<PathBuf> {
    let path = dir.join("trips.csv");
    fs::write(&path, TRIPS)?;
    Ok(path)
}

async fn analyze(options: &AnalyzeOptions) -> Result<String> {
    let mut buf = Vec::new();
    analyze_command(options, &mut buf).await?;
    Ok(String::from_utf8(buf)?)
}

#[tokio::test]
async fn test_analyze_json_per_dimension() -> Result<()> {
    let tmp = tempdir()?;
    let options = AnalyzeOptions {
        files: vec![write_trips(tmp.path())?],
        dimensions: vec![Dimension::PaymentType, Dimension::Continent],
        format: OutputFormat::Json,
        ..AnalyzeOptions::default()
    };

    let text = analyze(&options).await?;
    let lines: Vec<serde_json::Value> = text
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    assert_eq!(lines.len(), 2);

    assert_eq!(lines[0]["name"], "payment_type");
    let payments = lines[0]["rows"].as_array().cloned().unwrap_or_default();
    assert_eq!(payments.len(), 2);
    assert_eq!(payments[0]["payment_type"], 1);
    assert_eq!(payments[0]["count"], 3);

    assert_eq!(lines[1]["name"], "continent");
    let continents = lines[1]["rows"].as_array().cloned().unwrap_or_default();
    let total: u64 = continents.iter().filter_map(|r| r["count"].as_u64()).sum();
    assert_eq!(total, 5);
    assert_eq!(continents[0]["continent"], "North America");
    Ok(())
}

#[tokio::test]
async fn test_analyze_monthly_csv_with_limit() -> Result<()> {
    let tmp = tempdir()?;
    let options = AnalyzeOptions {
        files: vec![write_trips(tmp.path())?],
        dimensions: vec![Dimension::Year],
        format: OutputFormat::Csv,
        limit: Some(1),
        monthly: true,
        config: None,
    };

    let text = analyze(&options).await?;
    // Year (limited to one row), the day breakdown added for the rollup, then
    // the rollup itself
    assert_eq!(
        text,
        "# year\nyear,count\n2019,4\n\n\
         # day\nday,count,avg_fare\n2019-03-01,2,12\n\n\
         # monthly\nmonth,count\n2019-03,3\n"
    );
    Ok(())
}

#[tokio::test]
async fn test_analyze_with_config_file() -> Result<()> {
    let tmp = tempdir()?;
    let data = tmp.path().join("quakes.tsv");
    fs::write(&data, "time\tlat\tlon\n2020-01-01T00:00:00\t35.7\t139.7\n")?;
    let config = tmp.path().join("geotally.yaml");
    fs::write(
        &config,
        "columns:\n  timestamp: time\n  latitude: lat\n  longitude: lon\ndimensions: [continent]\n",
    )?;

    let options = AnalyzeOptions {
        files: vec![data],
        format: OutputFormat::Table,
        config: Some(config),
        ..AnalyzeOptions::default()
    };
    let text = analyze(&options).await?;
    assert!(text.starts_with("continent\n"));
    assert!(text.contains("| Asia      | 1     |"));
    Ok(())
}

#[tokio::test]
async fn test_analyze_reports_missing_file() -> Result<()> {
    let tmp = tempdir()?;
    let options = AnalyzeOptions {
        files: vec![tmp.path().join("missing.csv")],
        ..AnalyzeOptions::default()
    };
    let err = analyze(&options).await.expect_err("file does not exist");
    assert!(format!("{err:#}").contains("missing.csv"));
    Ok(())
}

#[tokio::test]
async fn test_count_rows() -> Result<()> {
    let tmp = tempdir()?;
    let trips = write_trips(tmp.path())?;
    let more = tmp.path().join("more.csv");
    fs::write(&more, "a,b\n1,2\n3,4\n")?;

    let mut buf = Vec::new();
    count_command(&[trips, more], None, &mut buf).await?;
    assert_eq!(String::from_utf8(buf)?, "7\n");
    Ok(())
}
