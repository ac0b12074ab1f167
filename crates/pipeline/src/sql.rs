//! SQL rendering for the engine path
//!
//! Every aggregation query has the same shape:
//!
//! ```sql
//! WITH source AS (   -- each registered table projected onto a common schema
//!     SELECT TRY_CAST("fare_amount" AS DOUBLE) AS "fare", ... FROM "a.csv"
//!     UNION ALL
//!     SELECT ... FROM "b.parquet"
//! ),
//! parsed AS (SELECT *, <timestamp parse> AS "ts" FROM source),
//! keyed AS (SELECT <key exprs>, <measure inputs> FROM parsed WHERE <filter>)
//! SELECT <keys>, COUNT(*) AS "count", AVG(...) AS "avg_fare"
//! FROM keyed GROUP BY <keys> ORDER BY ...
//! ```
//!
//! Only the columns a dimension actually reads are projected, so a file
//! without coordinates can still be bucketed by day.

use crate::config::ColumnMap;
use crate::continent;
use crate::dimension::{Dimension, KeyKind, Role, SortOrder};
use crate::error::{Error, Result};
use crate::timestamp;

/// Quote an identifier, doubling embedded quotes
#[must_use]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal, doubling embedded quotes
#[must_use]
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn projection(role: Role, source: &str) -> String {
    let column = quote_ident(source);
    let alias = quote_ident(role.alias());
    match role {
        Role::Timestamp => format!("trim(CAST({column} AS VARCHAR)) AS {alias}"),
        Role::PaymentType => format!("TRY_CAST({column} AS BIGINT) AS {alias}"),
        Role::Latitude
        | Role::Longitude
        | Role::Fare
        | Role::Tip
        | Role::Total
        | Role::Distance => format!("TRY_CAST({column} AS DOUBLE) AS {alias}"),
    }
}

fn key_expression(kind: KeyKind) -> String {
    let ts = quote_ident("ts");
    match kind {
        KeyKind::Year => format!("CAST(date_part('year', {ts}) AS BIGINT)"),
        KeyKind::Day => format!("CAST({ts} AS DATE)"),
        KeyKind::Hour => format!("CAST(date_part('hour', {ts}) AS BIGINT)"),
        KeyKind::Weekday => format!("CAST(date_part('dow', {ts}) AS BIGINT)"),
        KeyKind::PaymentType => quote_ident(Role::PaymentType.alias()),
        KeyKind::Continent => continent::case_expression(
            &quote_ident(Role::Latitude.alias()),
            &quote_ident(Role::Longitude.alias()),
        ),
    }
}

/// Render the aggregation query for `dimension` over every table in `tables`
pub fn render_query(dimension: Dimension, tables: &[String], columns: &ColumnMap) -> Result<String> {
    if tables.is_empty() {
        return Err(Error::NoTables);
    }
    let spec = dimension.spec();

    let projections: Vec<String> = spec
        .roles()
        .into_iter()
        .map(|role| projection(role, columns.column(role)))
        .collect();
    let selects: Vec<String> = tables
        .iter()
        .map(|table| format!("SELECT {} FROM {}", projections.join(", "), quote_ident(table)))
        .collect();

    let parsed = if spec.is_temporal() {
        format!(
            "SELECT *, {} AS {} FROM source",
            timestamp::parse_expression(&quote_ident(Role::Timestamp.alias())),
            quote_ident("ts")
        )
    } else {
        "SELECT * FROM source".to_string()
    };

    let keys: Vec<String> = spec.keys.iter().map(|k| quote_ident(k.column())).collect();
    let mut keyed_columns: Vec<String> = spec
        .keys
        .iter()
        .map(|k| format!("{} AS {}", key_expression(*k), quote_ident(k.column())))
        .collect();
    keyed_columns.extend(spec.measures.iter().map(|m| quote_ident(m.role().alias())));

    let mut filters = Vec::new();
    if spec.is_temporal() {
        filters.push(format!("{} IS NOT NULL", quote_ident("ts")));
    }
    if spec.paid_trips_only {
        filters.push(format!(
            "{} > 0 AND {} > 0",
            quote_ident(Role::Total.alias()),
            quote_ident(Role::Distance.alias())
        ));
    }
    let where_clause = if filters.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", filters.join(" AND "))
    };

    let mut outputs = keys.clone();
    outputs.push(format!("COUNT(*) AS {}", quote_ident("count")));
    outputs.extend(spec.measures.iter().map(|m| {
        format!(
            "AVG({}) AS {}",
            quote_ident(m.role().alias()),
            quote_ident(m.column())
        )
    }));

    let ascending: Vec<String> = keys.iter().map(|k| format!("{k} ASC NULLS LAST")).collect();
    let order = match spec.order {
        SortOrder::KeyAscending => ascending.join(", "),
        SortOrder::CountDescending => {
            format!("{} DESC, {}", quote_ident("count"), ascending.join(", "))
        }
    };

    Ok(format!(
        "WITH source AS ({}), parsed AS ({}), keyed AS (SELECT {} FROM parsed{}) \
         SELECT {} FROM keyed GROUP BY {} ORDER BY {}",
        selects.join(" UNION ALL "),
        parsed,
        keyed_columns.join(", "),
        where_clause,
        outputs.join(", "),
        keys.join(", "),
        order
    ))
}

/// Render a query returning the total row count across `tables` in a
/// single `rows` column
pub fn render_count(tables: &[String]) -> Result<String> {
    if tables.is_empty() {
        return Err(Error::NoTables);
    }
    let selects: Vec<String> = tables
        .iter()
        .map(|table| format!("SELECT 1 AS {} FROM {}", quote_ident("one"), quote_ident(table)))
        .collect();
    Ok(format!(
        "SELECT COUNT(*) AS {} FROM ({}) AS source",
        quote_ident("rows"),
        selects.join(" UNION ALL ")
    ))
}
