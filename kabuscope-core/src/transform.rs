//! Derived columns and date normalization.

use polars::prelude::*;
use tracing::debug;

use crate::data::{Dataset, DatasetError};
use crate::schema::{PriceSchema, CLOSE, DATE, HIGH, HIGH_LOW_SPREAD, LOW, OPEN, PRICE_CHANGE};

/// Text layouts accepted for a `Date` column, tried in order.
///
/// Time and offset fields are matched but dropped, so a timestamp keeps the
/// calendar date it was written with. Slash dates with the year last are
/// month-first.
pub const DATE_FORMATS: [&str; 9] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%dT%H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%m/%d/%Y %H:%M",
];

/// Add `Price_change = Close - Open` and `High_Low_Spread = High - Low` to every
/// row and make `Date` a calendar date.
///
/// Existing derived columns are overwritten. Price columns are cast to f64;
/// values that do not parse become null.
pub fn enrich(dataset: &Dataset) -> Result<Dataset, DatasetError> {
    PriceSchema::require_prices(dataset.frame())?;

    let frame = dataset
        .frame()
        .clone()
        .lazy()
        .with_columns([
            col(OPEN).cast(DataType::Float64),
            col(HIGH).cast(DataType::Float64),
            col(LOW).cast(DataType::Float64),
            col(CLOSE).cast(DataType::Float64),
        ])
        .with_columns([
            (col(CLOSE) - col(OPEN)).alias(PRICE_CHANGE),
            (col(HIGH) - col(LOW)).alias(HIGH_LOW_SPREAD),
        ])
        .collect()?;

    let frame = normalize_dates(frame)?;
    debug!(rows = frame.height(), "enriched dataset");
    Ok(Dataset::new(frame, dataset.derived_fingerprint("enrich")))
}

/// Coerce a `Date` column to the calendar-date type.
///
/// Naive datetimes are truncated to their date. Zoned datetimes are taken back
/// to their own wall clock first. Text is parsed with [`DATE_FORMATS`],
/// first match wins; unparseable cells become null. A frame without `Date`, or
/// with a type that is neither text nor temporal, is returned unchanged.
pub fn normalize_dates(frame: DataFrame) -> Result<DataFrame, DatasetError> {
    let dtype = match frame.schema().get(DATE) {
        Some(dtype) => dtype.clone(),
        None => return Ok(frame),
    };

    let expr = match dtype {
        DataType::Date => return Ok(frame),
        DataType::Datetime(_, None) => col(DATE).cast(DataType::Date),
        DataType::Datetime(_, Some(_)) => col(DATE).dt().date(),
        DataType::String => parse_date_text(),
        other => {
            debug!(dtype = %other, "leaving Date column as is");
            return Ok(frame);
        }
    };

    Ok(frame.lazy().with_column(expr.alias(DATE)).collect()?)
}

fn strptime(format: &str) -> Expr {
    col(DATE).str().to_date(StrptimeOptions {
        format: Some(format.into()),
        strict: false,
        exact: true,
        cache: true,
    })
}

/// `when(a ok) a else when(b ok) b else c`, built from the last format back.
fn parse_date_text() -> Expr {
    let mut formats = DATE_FORMATS.iter().rev();
    let mut expr = match formats.next() {
        Some(last) => strptime(last),
        None => col(DATE).cast(DataType::Date),
    };
    for format in formats {
        let parsed = strptime(format);
        expr = when(parsed.clone().is_not_null())
            .then(parsed)
            .otherwise(expr);
    }
    expr
}
