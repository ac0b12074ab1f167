//! Continent classification from latitude / longitude
//!
//! A coarse bounding-box classifier. Rules are tried in table order and the
//! first match wins; the boxes overlap, so the order matters. Every bound is
//! exclusive.
//!
//! The same table renders the SQL `CASE` expression used when the engine does
//! the grouping, so both paths always agree.

use crate::sql::quote_literal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Continent {
    #[serde(rename = "North America")]
    NorthAmerica,
    #[serde(rename = "Central America")]
    CentralAmerica,
    #[serde(rename = "South America")]
    SouthAmerica,
    Europe,
    Africa,
    Asia,
    Oceania,
    Unknown,
}

impl Continent {
    pub const ALL: [Continent; 8] = [
        Continent::NorthAmerica,
        Continent::CentralAmerica,
        Continent::SouthAmerica,
        Continent::Europe,
        Continent::Africa,
        Continent::Asia,
        Continent::Oceania,
        Continent::Unknown,
    ];

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Continent::NorthAmerica => "North America",
            Continent::CentralAmerica => "Central America",
            Continent::SouthAmerica => "South America",
            Continent::Europe => "Europe",
            Continent::Africa => "Africa",
            Continent::Asia => "Asia",
            Continent::Oceania => "Oceania",
            Continent::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Continent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Continent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Continent::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown continent: {s}"))
    }
}

/// Open interval; a missing bound is unbounded on that side
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Interval {
    const fn above(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    const fn below(max: f64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    const fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// NaN is never contained in a bounded interval
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value > min) && self.max.is_none_or(|max| value < max)
    }

    fn sql_conditions(&self, column: &str) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(min) = self.min {
            out.push(format!("{column} > {min}"));
        }
        if let Some(max) = self.max {
            out.push(format!("{column} < {max}"));
        }
        out
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ContinentRule {
    pub continent: Continent,
    pub lat: Interval,
    pub lon: Interval,
}

impl ContinentRule {
    #[must_use]
    pub fn matches(&self, lat: f64, lon: f64) -> bool {
        self.lat.contains(lat) && self.lon.contains(lon)
    }
}

/// Classification rules in priority order. Anything unmatched is `Unknown`.
///
/// South America sits below Central America, whose box covers it entirely,
/// so with this order it never matches.
pub const CONTINENT_RULES: [ContinentRule; 7] = [
    ContinentRule {
        continent: Continent::NorthAmerica,
        lat: Interval::above(0.0),
        lon: Interval::between(-170.0, -25.0),
    },
    ContinentRule {
        continent: Continent::CentralAmerica,
        lat: Interval::below(15.0),
        lon: Interval::between(-90.0, -25.0),
    },
    ContinentRule {
        continent: Continent::SouthAmerica,
        lat: Interval::below(0.0),
        lon: Interval::between(-80.0, -25.0),
    },
    ContinentRule {
        continent: Continent::Europe,
        lat: Interval::above(35.0),
        lon: Interval::between(-10.0, 60.0),
    },
    ContinentRule {
        continent: Continent::Africa,
        lat: Interval::between(-40.0, 35.0),
        lon: Interval::between(-20.0, 55.0),
    },
    ContinentRule {
        continent: Continent::Asia,
        lat: Interval::above(5.0),
        lon: Interval::between(60.0, 180.0),
    },
    ContinentRule {
        continent: Continent::Oceania,
        lat: Interval::below(0.0),
        lon: Interval::between(110.0, 180.0),
    },
];

/// Classify one coordinate pair. Missing coordinates are `Unknown`.
#[must_use]
pub fn classify(lat: Option<f64>, lon: Option<f64>) -> Continent {
    let (Some(lat), Some(lon)) = (lat, lon) else {
        return Continent::Unknown;
    };
    CONTINENT_RULES
        .iter()
        .find(|rule| rule.matches(lat, lon))
        .map_or(Continent::Unknown, |rule| rule.continent)
}

/// SQL `CASE` expression equivalent to [`classify`] over two numeric columns.
///
/// NULL coordinates make every comparison NULL, which falls through to
/// `'Unknown'` exactly like the Rust path.
#[must_use]
pub fn case_expression(lat: &str, lon: &str) -> String {
    let mut sql = String::from("CASE");
    for rule in &CONTINENT_RULES {
        let mut conditions = rule.lat.sql_conditions(lat);
        conditions.extend(rule.lon.sql_conditions(lon));
        sql.push_str(&format!(
            " WHEN {} THEN {}",
            conditions.join(" AND "),
            quote_literal(rule.continent.label())
        ));
    }
    sql.push_str(&format!(" ELSE {} END", quote_literal(Continent::Unknown.label())));
    sql
}
