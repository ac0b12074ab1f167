//! In-memory aggregation over raw records
//!
//! Produces exactly the rows the engine path returns for the same data, so
//! it serves both as a reference for tests and for callers that already hold
//! records in memory.

use crate::continent::classify;
use crate::dimension::{Dimension, KeyKind, Measure, SortOrder};
use crate::record::RawRecord;
use crate::rows::{Row, Value};
use crate::timestamp::parse_timestamp;
use chrono::{Datelike, NaiveDateTime, Timelike};
use std::collections::BTreeMap;

/// Group key component. Variant order puts nulls last.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Key {
    Int(i64),
    Text(String),
    Null,
}

impl From<Key> for Value {
    fn from(key: Key) -> Self {
        match key {
            Key::Int(i) => Value::from(i),
            Key::Text(s) => Value::Text(s),
            Key::Null => Value::Null,
        }
    }
}

#[derive(Default)]
struct Accumulator {
    count: u64,
    /// (sum, n) per measure
    sums: Vec<(f64, u64)>,
}

fn key_of(kind: KeyKind, record: &RawRecord, ts: Option<NaiveDateTime>) -> Key {
    match kind {
        KeyKind::Year => ts.map_or(Key::Null, |t| Key::Int(i64::from(t.year()))),
        KeyKind::Day => ts.map_or(Key::Null, |t| Key::Text(t.format("%Y-%m-%d").to_string())),
        KeyKind::Hour => ts.map_or(Key::Null, |t| Key::Int(i64::from(t.hour()))),
        KeyKind::Weekday => ts.map_or(Key::Null, |t| {
            Key::Int(i64::from(t.weekday().num_days_from_sunday()))
        }),
        KeyKind::PaymentType => record.payment_type.map_or(Key::Null, Key::Int),
        KeyKind::Continent => {
            Key::Text(classify(record.latitude, record.longitude).label().to_string())
        }
    }
}

fn measure_input(measure: Measure, record: &RawRecord) -> Option<f64> {
    match measure {
        Measure::AvgFare => record.fare_amount,
        Measure::AvgTip => record.tip_amount,
        Measure::AvgTotal => record.total_amount,
    }
}

/// Aggregate `records` along `dimension`
#[must_use]
pub fn aggregate(records: &[RawRecord], dimension: Dimension) -> Vec<Row> {
    let spec = dimension.spec();
    let mut groups: BTreeMap<Vec<Key>, Accumulator> = BTreeMap::new();

    for record in records {
        if spec.paid_trips_only && !record.is_paid_trip() {
            continue;
        }
        let ts = if spec.is_temporal() {
            match record.timestamp.as_deref().and_then(parse_timestamp) {
                Some(ts) => Some(ts),
                None => continue,
            }
        } else {
            None
        };

        let key: Vec<Key> = spec.keys.iter().map(|k| key_of(*k, record, ts)).collect();
        let acc = groups.entry(key).or_insert_with(|| Accumulator {
            count: 0,
            sums: vec![(0.0, 0); spec.measures.len()],
        });
        acc.count += 1;
        for (slot, measure) in acc.sums.iter_mut().zip(spec.measures) {
            if let Some(v) = measure_input(*measure, record) {
                slot.0 += v;
                slot.1 += 1;
            }
        }
    }

    let mut grouped: Vec<(Vec<Key>, Accumulator)> = groups.into_iter().collect();
    if spec.order == SortOrder::CountDescending {
        // Stable: equal counts stay in ascending key order
        grouped.sort_by(|a, b| b.1.count.cmp(&a.1.count));
    }

    grouped
        .into_iter()
        .map(|(key, acc)| {
            let mut row = Row::new();
            for (kind, part) in spec.keys.iter().zip(key) {
                row.push(kind.column(), part);
            }
            row.push("count", acc.count);
            for (measure, (sum, n)) in spec.measures.iter().zip(acc.sums) {
                let mean = (n > 0).then(|| sum / n as f64);
                row.push(measure.column(), mean);
            }
            row
        })
        .collect()
}

/// Count per calendar year, ascending; unparseable timestamps excluded
#[must_use]
pub fn aggregate_by_year(records: &[RawRecord]) -> Vec<Row> {
    aggregate(records, Dimension::Year)
}

/// Count and mean fare per calendar day of paid trips, ascending
#[must_use]
pub fn aggregate_by_day(records: &[RawRecord]) -> Vec<Row> {
    aggregate(records, Dimension::Day)
}

/// Count and mean fare per (hour, weekday) of paid trips, ascending
#[must_use]
pub fn aggregate_by_hour_and_weekday(records: &[RawRecord]) -> Vec<Row> {
    aggregate(records, Dimension::HourWeekday)
}

/// Count, mean tip and mean total per payment type of paid trips, by
/// descending count
#[must_use]
pub fn aggregate_by_payment_type(records: &[RawRecord]) -> Vec<Row> {
    aggregate(records, Dimension::PaymentType)
}

/// Count per continent over every record, by descending count
#[must_use]
pub fn aggregate_by_continent(records: &[RawRecord]) -> Vec<Row> {
    aggregate(records, Dimension::Continent)
}
