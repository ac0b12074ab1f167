use crate::rows::Row;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Sum daily counts into `YYYY-MM` buckets, ascending.
///
/// Rows whose `day` is not a valid date, or whose `count` is not positive,
/// are skipped.
#[must_use]
pub fn rollup_monthly(day_rows: &[Row]) -> Vec<Row> {
    let mut months: BTreeMap<String, u64> = BTreeMap::new();
    for row in day_rows {
        let Some(day) = row
            .text("day")
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        else {
            continue;
        };
        let count = row.count();
        if count == 0 {
            continue;
        }
        *months.entry(day.format("%Y-%m").to_string()).or_default() += count;
    }

    months
        .into_iter()
        .map(|(month, count)| Row::new().with("month", month).with("count", count))
        .collect()
}
