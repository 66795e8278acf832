//! Symbol and date-range filters.
//!
//! Both filters keep input row order and are idempotent. A filter whose column
//! is absent (or, for dates, not typed as a calendar date) passes the dataset
//! through unchanged. An empty result is a valid dataset.

use polars::prelude::*;
use tracing::debug;

use crate::data::{Dataset, DatasetError};
use crate::domain::{days_since_epoch, DateRange};
use crate::schema::{PriceSchema, DATE, SYMBOL};

/// Keep exactly the rows whose `Symbol` equals `symbol`.
pub fn select_symbol(dataset: &Dataset, symbol: &str) -> Result<Dataset, DatasetError> {
    if !dataset.has_column(SYMBOL) {
        return Ok(dataset.clone());
    }

    let frame = dataset
        .frame()
        .clone()
        .lazy()
        .filter(col(SYMBOL).cast(DataType::String).eq(lit(symbol)))
        .collect()?;

    debug!(symbol, rows = frame.height(), "symbol filter");
    Ok(Dataset::new(
        frame,
        dataset.derived_fingerprint(&format!("symbol={symbol}")),
    ))
}

/// Keep rows with `range.start <= Date <= range.end`.
///
/// Callers clamp the range to the observed bounds; it is not re-validated here.
pub fn select_dates(dataset: &Dataset, range: DateRange) -> Result<Dataset, DatasetError> {
    if !PriceSchema::has_typed_dates(dataset.frame()) {
        return Ok(dataset.clone());
    }

    let start = days_since_epoch(range.start);
    let end = days_since_epoch(range.end);
    let day = col(DATE).cast(DataType::Int32);

    let frame = dataset
        .frame()
        .clone()
        .lazy()
        .filter(day.clone().gt_eq(lit(start)).and(day.lt_eq(lit(end))))
        .collect()?;

    debug!(%range, rows = frame.height(), "date filter");
    Ok(Dataset::new(
        frame,
        dataset.derived_fingerprint(&format!("dates={range}")),
    ))
}

/// Symbol filter (when a symbol is given) followed by the date filter (when a
/// range is given).
pub fn select(
    dataset: &Dataset,
    symbol: Option<&str>,
    range: Option<DateRange>,
) -> Result<Dataset, DatasetError> {
    let by_symbol = match symbol {
        Some(symbol) => select_symbol(dataset, symbol)?,
        None => dataset.clone(),
    };
    match range {
        Some(range) => select_dates(&by_symbol, range),
        None => Ok(by_symbol),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RawBar;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn bars(days: &[u32], base: f64) -> Vec<RawBar> {
        days.iter()
            .map(|&day| RawBar {
                date: d(day),
                open: base,
                high: base + 2.0,
                low: base - 2.0,
                close: base + f64::from(day),
                volume: 100,
            })
            .collect()
    }

    fn sample() -> Dataset {
        Dataset::from_tagged_bars(&[
            ("SONY".into(), bars(&[4, 5, 9], 100.0)),
            ("NINTENDO".into(), bars(&[4, 5, 9, 10], 200.0)),
        ])
        .unwrap()
    }

    #[test]
    fn symbol_filter_is_exclusive() {
        let out = select_symbol(&sample(), "NINTENDO").unwrap();
        assert_eq!(out.height(), 4);
        assert!(out.rows().unwrap().iter().all(|r| r.symbol == "NINTENDO"));
    }

    #[test]
    fn unknown_symbol_yields_empty() {
        let out = select_symbol(&sample(), "HONDA").unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn date_filter_is_inclusive_at_both_ends() {
        let out = select_dates(&sample(), DateRange::new(d(5), d(9))).unwrap();
        let dates: Vec<_> = out.rows().unwrap().iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d(5), d(9), d(5), d(9)]);
    }

    #[test]
    fn select_preserves_order() {
        let out = select(&sample(), Some("NINTENDO"), Some(DateRange::new(d(1), d(31)))).unwrap();
        let dates: Vec<_> = out.rows().unwrap().iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d(4), d(5), d(9), d(10)]);
    }

    #[test]
    fn filtering_twice_changes_nothing() {
        let range = Some(DateRange::new(d(5), d(9)));
        let once = select(&sample(), Some("SONY"), range).unwrap();
        let twice = select(&once, Some("SONY"), range).unwrap();
        assert!(once.frame().equals(twice.frame()));
    }

    #[test]
    fn missing_columns_skip_filters() {
        let frame = df!("Close" => &[1.0, 2.0]).unwrap();
        let ds = Dataset::new(frame, "x");
        let out = select(&ds, Some("SONY"), Some(DateRange::new(d(1), d(2)))).unwrap();
        assert_eq!(out.height(), 2);
    }

    #[test]
    fn filtered_fingerprint_tracks_parameters() {
        let ds = sample();
        let a = select_symbol(&ds, "SONY").unwrap();
        let b = select_symbol(&ds, "NINTENDO").unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), select_symbol(&ds, "SONY").unwrap().fingerprint());
    }
}
