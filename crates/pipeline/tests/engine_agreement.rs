//! The SQL path and the in-memory path must produce the same rows

use anyhow::Result;
use engine::{DataFusionDatabase, FileFormat};
use pipeline::{
    Dimension, PipelineConfig, Pipeline, RawRecord, Row, SourceFile, Value, aggregate,
    analyze_files,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const HEADER: &str = "tpep_pickup_datetime,latitude,longitude,payment_type,fare_amount,tip_amount,total_amount,trip_distance";

fn field<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn to_csv(records: &[RawRecord]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for r in records {
        let ts = r
            .timestamp
            .as_ref()
            .map(|t| format!("\"{t}\""))
            .unwrap_or_default();
        out.push_str(&format!(
            "{ts},{},{},{},{},{},{},{}\n",
            field(r.latitude),
            field(r.longitude),
            field(r.payment_type),
            field(r.fare_amount),
            field(r.tip_amount),
            field(r.total_amount),
            field(r.trip_distance),
        ));
    }
    out
}

fn random_timestamp(rng: &mut StdRng) -> Option<String> {
    let year = rng.gen_range(2018..=2020);
    let month = rng.gen_range(1..=12);
    let day = rng.gen_range(1..=28);
    let (h, m, s) = (rng.gen_range(0..24), rng.gen_range(0..60), rng.gen_range(0..60));
    match rng.gen_range(0..7) {
        0 => Some(format!("{year}-{month:02}-{day:02}T{h:02}:{m:02}:{s:02}")),
        1 => Some(format!("{year}-{month:02}-{day:02}T{h:02}:{m:02}:{s:02}Z")),
        2 => Some(format!("{month:02}/{day:02}/{year},{h:02}:{m:02}:{s:02}")),
        3 => Some(format!("{month:02}/{day:02}/{year}")),
        4 => Some(format!("  {year}-{month:02}-{day:02}T{h:02}:{m:02}:{s:02}  ")),
        5 => Some("not-a-date".to_string()),
        _ => None,
    }
}

fn cents(rng: &mut StdRng, max: u32) -> f64 {
    f64::from(rng.gen_range(0..=max * 100)) / 100.0
}

fn random_records(n: usize, seed: u64) -> Vec<RawRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut records = Vec::with_capacity(n);
    for _ in 0..n {
        let mut record = RawRecord {
            timestamp: random_timestamp(&mut rng),
            ..RawRecord::default()
        };
        if rng.gen_bool(0.9) {
            record = record.with_location(rng.gen_range(-60.0..75.0), rng.gen_range(-180.0..180.0));
        }
        if rng.gen_bool(0.9) {
            record = record.with_payment_type(rng.gen_range(1..=4));
        }
        let fare = cents(&mut rng, 60);
        let tip = cents(&mut rng, 10);
        let distance = if rng.gen_bool(0.1) { 0.0 } else { cents(&mut rng, 20) };
        let total = if rng.gen_bool(0.1) { -fare } else { fare + tip };
        record = record.with_trip(distance, fare, tip, total);
        if rng.gen_bool(0.05) {
            record.tip_amount = None;
        }
        records.push(record);
    }
    records
}

fn assert_rows_match(dimension: Dimension, engine: &[Row], memory: &[Row]) {
    assert_eq!(engine.len(), memory.len(), "{dimension}: row count");
    for (i, (e, m)) in engine.iter().zip(memory).enumerate() {
        let names: Vec<_> = e.names().collect();
        assert_eq!(names, m.names().collect::<Vec<_>>(), "{dimension}: columns");
        for (name, expected) in m.fields() {
            let actual = e.get(name).cloned().unwrap_or(Value::Null);
            match (&actual, expected) {
                (Value::Number(a), Value::Number(b)) if name.starts_with("avg_") => {
                    assert!(
                        (a - b).abs() <= 1e-9 * b.abs().max(1.0),
                        "{dimension} row {i} {name}: {a} != {b}"
                    );
                }
                _ => assert_eq!(&actual, expected, "{dimension} row {i} {name}"),
            }
        }
    }
}

#[tokio::test]
async fn test_every_dimension_agrees_with_in_memory() -> Result<()> {
    let records = random_records(400, 7);
    let config = PipelineConfig {
        dimensions: Dimension::ALL.to_vec(),
        ..PipelineConfig::default()
    };
    let pipeline = Pipeline::new(config);
    let db = DataFusionDatabase::new();

    // Split across two files so the union is exercised
    let (first, second) = records.split_at(records.len() / 2);
    let files = vec![
        SourceFile::from_bytes("first.csv", FileFormat::Csv, to_csv(first)),
        SourceFile::from_bytes("second.csv", FileFormat::Csv, to_csv(second)),
    ];
    let report = analyze_files(&db, &pipeline, &files).await?;

    assert_eq!(report.tables, vec!["first.csv", "second.csv"]);
    assert_eq!(db.open_connections(), 0);
    for dimension in Dimension::ALL {
        let engine_rows = report.get(dimension).unwrap_or_default();
        let memory_rows = aggregate(&records, dimension);
        assert!(!memory_rows.is_empty(), "{dimension}: no rows generated");
        assert_rows_match(dimension, engine_rows, &memory_rows);
    }
    Ok(())
}

/// Each file holds a single timestamp layout, so the decoder sees a column
/// that looks uniformly typed
#[tokio::test]
async fn test_single_layout_columns_agree_with_in_memory() -> Result<()> {
    let iso: Vec<RawRecord> = (1..=6)
        .map(|h| {
            RawRecord::at(format!("2019-03-0{}T{:02}:30:00", h % 3 + 1, h * 3))
                .with_trip(1.0, f64::from(h) * 4.0, 1.0, f64::from(h) * 4.0 + 1.0)
        })
        .collect();
    let spaced: Vec<RawRecord> = (1..=4)
        .map(|h| {
            RawRecord::at(format!("2019-04-0{h} 1{h}:00:00")).with_trip(2.0, 10.0, 0.0, 10.0)
        })
        .collect();
    let dates: Vec<RawRecord> = ["2020-01-05", "2020-01-06"]
        .into_iter()
        .map(|d| RawRecord::at(d).with_trip(1.0, 7.0, 0.0, 7.0))
        .collect();

    let config = PipelineConfig {
        dimensions: vec![Dimension::Year, Dimension::Day, Dimension::HourWeekday],
        ..PipelineConfig::default()
    };
    let pipeline = Pipeline::new(config);
    let db = DataFusionDatabase::new();
    let files = vec![
        SourceFile::from_bytes("iso.csv", FileFormat::Csv, to_csv(&iso)),
        SourceFile::from_bytes("spaced.csv", FileFormat::Csv, to_csv(&spaced)),
        SourceFile::from_bytes("dates.csv", FileFormat::Csv, to_csv(&dates)),
    ];
    let report = analyze_files(&db, &pipeline, &files).await?;

    let records: Vec<RawRecord> = iso.into_iter().chain(spaced).chain(dates).collect();
    for dimension in [Dimension::Year, Dimension::Day, Dimension::HourWeekday] {
        let engine_rows = report.get(dimension).unwrap_or_default();
        assert_rows_match(dimension, engine_rows, &aggregate(&records, dimension));
    }

    // Only the ISO file parses; space-separated and bare ISO dates do not
    let years = report.get(Dimension::Year).unwrap_or_default();
    assert_eq!(years, [Row::new().with("year", 2019_i64).with("count", 6_u64)]);
    Ok(())
}

/// A malformed value after the inference sample is excluded, not fatal
#[tokio::test]
async fn test_late_malformed_timestamp_is_excluded() -> Result<()> {
    let csv = "time,n\n2019-03-01T10:00:00,1\n2019-03-01T10:00:00 approx,2\n";
    let mut config = PipelineConfig::default();
    config.columns.timestamp = "time".to_string();
    config.dimensions = vec![Dimension::Year];
    config.engine.csv.schema_infer_max_records = 1;
    let pipeline = Pipeline::new(config);

    let db = DataFusionDatabase::new();
    let files = vec![SourceFile::from_bytes("late.csv", FileFormat::Csv, csv)];
    let report = analyze_files(&db, &pipeline, &files).await?;

    let rows = report.get(Dimension::Year).unwrap_or_default();
    assert_eq!(rows, [Row::new().with("year", 2019_i64).with("count", 1_u64)]);
    assert_eq!(db.open_connections(), 0);
    Ok(())
}

#[tokio::test]
async fn test_year_skips_unparseable_timestamps() -> Result<()> {
    let csv = "time,note\n2019-03-01T10:00:00,a\nnot-a-date,b\n03/15/2020,c\n   ,d\n";
    let mut config = PipelineConfig::default();
    config.columns.timestamp = "time".to_string();
    config.dimensions = vec![Dimension::Year];
    let pipeline = Pipeline::new(config);

    let db = DataFusionDatabase::new();
    let files = vec![SourceFile::from_bytes("events.csv", FileFormat::Csv, csv)];
    let report = analyze_files(&db, &pipeline, &files).await?;

    let rows = report.get(Dimension::Year).unwrap_or_default();
    assert_eq!(
        rows,
        [
            Row::new().with("year", 2019_i64).with("count", 1_u64),
            Row::new().with("year", 2020_i64).with("count", 1_u64),
        ]
    );
    assert_eq!(rows.iter().map(Row::count).sum::<u64>(), 2);
    Ok(())
}

#[tokio::test]
async fn test_semicolon_files_with_custom_columns() -> Result<()> {
    let csv = "pickup;lat;lng\n2019-03-01T10:00:00;40.7;-74.0\n2019-03-01T11:00:00;48.8;2.3\n2019-03-01T12:00:00;;\n";
    let yaml = "columns:\n  timestamp: pickup\n  latitude: lat\n  longitude: lng\ndimensions: [continent]\n";
    let pipeline = Pipeline::new(PipelineConfig::from_yaml_str(yaml)?);

    let db = DataFusionDatabase::new();
    let files = vec![SourceFile::from_bytes("points.csv", FileFormat::Csv, csv)];
    let report = analyze_files(&db, &pipeline, &files).await?;

    let labels: Vec<_> = report
        .get(Dimension::Continent)
        .unwrap_or_default()
        .iter()
        .filter_map(|r| r.text("continent").map(str::to_string))
        .collect();
    assert_eq!(labels, vec!["Europe", "North America", "Unknown"]);
    Ok(())
}
