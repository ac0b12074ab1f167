//! Tolerant timestamp parsing
//!
//! Source files mix three layouts in the same column. Each layout is tried in
//! order and must match its full shape before the date itself is validated:
//!
//! | layout             | example                 |
//! |--------------------|-------------------------|
//! | ISO-8601 with time | `2019-03-01T10:00:00Z`  |
//! | US date and time   | `03/15/2020,08:30:00`   |
//! | US date            | `03/15/2020`            |
//!
//! The ISO shape requires `YYYY-MM-DDTHH:MM:SS` at the start of the value, so
//! arbitrary text that merely contains a `T` is not mistaken for a timestamp.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampLayout {
    Iso,
    UsDateTime,
    UsDate,
}

/// Layouts in the order they are attempted
pub const TIMESTAMP_LAYOUTS: [TimestampLayout; 3] = [
    TimestampLayout::Iso,
    TimestampLayout::UsDateTime,
    TimestampLayout::UsDate,
];

static ISO_SHAPE: LazyLock<Regex> = LazyLock::new(|| shape(TimestampLayout::Iso));
static US_DATE_TIME_SHAPE: LazyLock<Regex> = LazyLock::new(|| shape(TimestampLayout::UsDateTime));
static US_DATE_SHAPE: LazyLock<Regex> = LazyLock::new(|| shape(TimestampLayout::UsDate));

#[allow(clippy::expect_used)]
fn shape(layout: TimestampLayout) -> Regex {
    Regex::new(layout.shape_pattern()).expect("timestamp shape patterns are valid")
}

impl TimestampLayout {
    /// Regex every value must match before parsing is attempted.
    ///
    /// Written with `[0-9]` rather than `\d` so the same text is valid in SQL
    /// string literals.
    #[must_use]
    pub fn shape_pattern(&self) -> &'static str {
        match self {
            TimestampLayout::Iso => "^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}",
            TimestampLayout::UsDateTime => "^[0-9]{2}/[0-9]{2}/[0-9]{4},[0-9]{2}:[0-9]{2}:[0-9]{2}$",
            TimestampLayout::UsDate => "^[0-9]{2}/[0-9]{2}/[0-9]{4}$",
        }
    }

    fn shape(&self) -> &'static Regex {
        match self {
            TimestampLayout::Iso => &ISO_SHAPE,
            TimestampLayout::UsDateTime => &US_DATE_TIME_SHAPE,
            TimestampLayout::UsDate => &US_DATE_SHAPE,
        }
    }

    /// Parse `raw` (already trimmed) in this layout
    #[must_use]
    pub fn parse(&self, raw: &str) -> Option<NaiveDateTime> {
        if !self.shape().is_match(raw) {
            return None;
        }
        match self {
            TimestampLayout::Iso => DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.naive_utc())
                .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
                .ok(),
            TimestampLayout::UsDateTime => NaiveDateTime::parse_from_str(raw, "%m/%d/%Y,%H:%M:%S").ok(),
            TimestampLayout::UsDate => NaiveDate::parse_from_str(raw, "%m/%d/%Y")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN)),
        }
    }

    /// SQL producing a timestamp from the trimmed string expression `raw`,
    /// or NULL when the date or time is invalid. Only meaningful where the
    /// shape already matched.
    fn sql_conversion(&self, raw: &str) -> String {
        // Rebuild US layouts as ISO text: YYYY-MM-DDTHH:MM:SS
        let us_date = format!("substr({raw}, 7, 4), '-', substr({raw}, 1, 2), '-', substr({raw}, 4, 2)");
        let text = match self {
            TimestampLayout::Iso => raw.to_string(),
            TimestampLayout::UsDateTime => format!("concat({us_date}, 'T', substr({raw}, 12, 8))"),
            TimestampLayout::UsDate => format!("concat({us_date}, 'T00:00:00')"),
        };
        format!("TRY_CAST({text} AS TIMESTAMP(6))")
    }
}

/// Parse a raw timestamp field.
///
/// Returns `None` for empty or whitespace-only input and for anything that
/// matches none of the layouts. Offsets are normalized to UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    TIMESTAMP_LAYOUTS.iter().find_map(|layout| layout.parse(raw))
}

/// SQL expression equivalent to [`parse_timestamp`] over a trimmed string
/// expression. Evaluates to NULL where the Rust parser returns `None`.
#[must_use]
pub fn parse_expression(raw: &str) -> String {
    let mut sql = String::from("CASE");
    for layout in TIMESTAMP_LAYOUTS {
        sql.push_str(&format!(
            " WHEN regexp_like({raw}, '{}') THEN {}",
            layout.shape_pattern(),
            layout.sql_conversion(raw)
        ));
    }
    sql.push_str(" END");
    sql
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, s))
            .expect("valid test timestamp")
    }

    #[test]
    fn test_iso_layouts() {
        assert_eq!(parse_timestamp("2019-03-01T10:00:00"), Some(ts(2019, 3, 1, 10, 0, 0)));
        assert_eq!(parse_timestamp("2019-03-01T10:00:00.250"), Some(ts(2019, 3, 1, 10, 0, 0)).map(|t| t + chrono::Duration::milliseconds(250)));
        assert_eq!(parse_timestamp("2019-03-01T10:00:00Z"), Some(ts(2019, 3, 1, 10, 0, 0)));
        // Offsets are folded into UTC
        assert_eq!(parse_timestamp("2019-03-01T01:30:00+02:00"), Some(ts(2019, 2, 28, 23, 30, 0)));
    }

    #[test]
    fn test_us_layouts() {
        assert_eq!(parse_timestamp("03/15/2020,08:30:05"), Some(ts(2020, 3, 15, 8, 30, 5)));
        assert_eq!(parse_timestamp("03/15/2020"), Some(ts(2020, 3, 15, 0, 0, 0)));
        assert_eq!(parse_timestamp("  03/15/2020  "), Some(ts(2020, 3, 15, 0, 0, 0)));
    }

    #[test]
    fn test_rejects_empty_and_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   \t"), None);
        assert_eq!(parse_timestamp("not-a-date"), None);
        // Contains a T but is not ISO
        assert_eq!(parse_timestamp("Tuesday"), None);
        assert_eq!(parse_timestamp("2019-03-01 10:00:00"), None);
        // Shape matches, calendar does not
        assert_eq!(parse_timestamp("02/30/2020"), None);
        assert_eq!(parse_timestamp("13/01/2020,10:00:00"), None);
        assert_eq!(parse_timestamp("2019-02-29T10:00:00"), None);
        // Unpadded US dates do not match the shape
        assert_eq!(parse_timestamp("3/5/2020"), None);
        assert_eq!(parse_timestamp("2019-03-01T10:00:00garbage"), None);
    }

    #[test]
    fn test_layout_order_is_iso_first() {
        let parsed = parse_timestamp("2021-12-31T23:59:59").expect("iso parses");
        assert_eq!(parsed.year(), 2021);
        assert_eq!(parsed.hour(), 23);
        assert_eq!(TIMESTAMP_LAYOUTS[0], TimestampLayout::Iso);
    }

    #[test]
    fn test_parse_expression_covers_every_layout() {
        let sql = parse_expression("\"ts_raw\"");
        assert!(sql.starts_with("CASE WHEN regexp_like(\"ts_raw\", '^[0-9]{4}-"));
        assert_eq!(sql.matches("TRY_CAST(").count(), 3);
        assert!(sql.ends_with(" END"));
        assert!(!sql.contains('\\'));
    }
}
