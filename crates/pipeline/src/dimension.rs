//! Declarative aggregation dimensions
//!
//! Each [`Dimension`] maps to a [`DimensionSpec`] describing its grouping
//! keys, averaged measures, row filter and output order. Both the in-memory
//! aggregation and the SQL renderer are driven from this table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Year,
    Day,
    HourWeekday,
    PaymentType,
    Continent,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Year,
        Dimension::Day,
        Dimension::HourWeekday,
        Dimension::PaymentType,
        Dimension::Continent,
    ];

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Dimension::Year => "year",
            Dimension::Day => "day",
            Dimension::HourWeekday => "hour_weekday",
            Dimension::PaymentType => "payment_type",
            Dimension::Continent => "continent",
        }
    }

    #[must_use]
    pub fn spec(&self) -> DimensionSpec {
        match self {
            Dimension::Year => DimensionSpec {
                keys: &[KeyKind::Year],
                measures: &[],
                paid_trips_only: false,
                order: SortOrder::KeyAscending,
            },
            Dimension::Day => DimensionSpec {
                keys: &[KeyKind::Day],
                measures: &[Measure::AvgFare],
                paid_trips_only: true,
                order: SortOrder::KeyAscending,
            },
            Dimension::HourWeekday => DimensionSpec {
                keys: &[KeyKind::Hour, KeyKind::Weekday],
                measures: &[Measure::AvgFare],
                paid_trips_only: true,
                order: SortOrder::KeyAscending,
            },
            Dimension::PaymentType => DimensionSpec {
                keys: &[KeyKind::PaymentType],
                measures: &[Measure::AvgTip, Measure::AvgTotal],
                paid_trips_only: true,
                order: SortOrder::CountDescending,
            },
            Dimension::Continent => DimensionSpec {
                keys: &[KeyKind::Continent],
                measures: &[],
                paid_trips_only: false,
                order: SortOrder::CountDescending,
            },
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_");
        Dimension::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| {
                let names: Vec<_> = Dimension::ALL.iter().map(Dimension::name).collect();
                format!("unknown dimension '{s}', expected one of: {}", names.join(", "))
            })
    }
}

/// A grouping key column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Year,
    /// Calendar day, `YYYY-MM-DD`
    Day,
    /// 0..=23
    Hour,
    /// 0..=6, 0 = Sunday
    Weekday,
    PaymentType,
    Continent,
}

impl KeyKind {
    /// Output column name
    #[must_use]
    pub fn column(&self) -> &'static str {
        match self {
            KeyKind::Year => "year",
            KeyKind::Day => "day",
            KeyKind::Hour => "hour",
            KeyKind::Weekday => "weekday",
            KeyKind::PaymentType => "payment_type",
            KeyKind::Continent => "continent",
        }
    }

    #[must_use]
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            KeyKind::Year | KeyKind::Day | KeyKind::Hour | KeyKind::Weekday
        )
    }

    fn roles(&self) -> &'static [Role] {
        match self {
            KeyKind::Year | KeyKind::Day | KeyKind::Hour | KeyKind::Weekday => &[Role::Timestamp],
            KeyKind::PaymentType => &[Role::PaymentType],
            KeyKind::Continent => &[Role::Latitude, Role::Longitude],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    AvgFare,
    AvgTip,
    AvgTotal,
}

impl Measure {
    /// Output column name
    #[must_use]
    pub fn column(&self) -> &'static str {
        match self {
            Measure::AvgFare => "avg_fare",
            Measure::AvgTip => "avg_tip",
            Measure::AvgTotal => "avg_total",
        }
    }

    /// Source field being averaged
    #[must_use]
    pub fn role(&self) -> Role {
        match self {
            Measure::AvgFare => Role::Fare,
            Measure::AvgTip => Role::Tip,
            Measure::AvgTotal => Role::Total,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending by key, nulls last
    KeyAscending,
    /// Descending by count, ties ascending by key
    CountDescending,
}

/// A source field the aggregations read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Timestamp,
    Latitude,
    Longitude,
    PaymentType,
    Fare,
    Tip,
    Total,
    Distance,
}

impl Role {
    pub const ALL: [Role; 8] = [
        Role::Timestamp,
        Role::Latitude,
        Role::Longitude,
        Role::PaymentType,
        Role::Fare,
        Role::Tip,
        Role::Total,
        Role::Distance,
    ];

    /// Column name after projection onto the common schema
    #[must_use]
    pub fn alias(&self) -> &'static str {
        match self {
            Role::Timestamp => "ts_raw",
            Role::Latitude => "latitude",
            Role::Longitude => "longitude",
            Role::PaymentType => "payment_code",
            Role::Fare => "fare",
            Role::Tip => "tip",
            Role::Total => "total",
            Role::Distance => "distance",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DimensionSpec {
    pub keys: &'static [KeyKind],
    pub measures: &'static [Measure],
    /// Keep only records with `total > 0` and `distance > 0`
    pub paid_trips_only: bool,
    pub order: SortOrder,
}

impl DimensionSpec {
    /// Records without a parseable timestamp are dropped
    #[must_use]
    pub fn is_temporal(&self) -> bool {
        self.keys.iter().any(KeyKind::is_temporal)
    }

    /// Source fields read by this dimension, in [`Role::ALL`] order
    #[must_use]
    pub fn roles(&self) -> Vec<Role> {
        let mut needed: Vec<Role> = self
            .keys
            .iter()
            .flat_map(|k| k.roles().iter().copied())
            .chain(self.measures.iter().map(Measure::role))
            .collect();
        if self.paid_trips_only {
            needed.extend([Role::Total, Role::Distance]);
        }
        Role::ALL
            .into_iter()
            .filter(|role| needed.contains(role))
            .collect()
    }
}
