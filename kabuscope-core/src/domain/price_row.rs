//! PriceRow: one daily observation for one company.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV observation with its two derived columns.
///
/// `price_change` and `high_low_spread` are always computed by the transform
/// stage; they are never read from input as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub price_change: f64,
    pub high_low_spread: f64,
}

impl PriceRow {
    /// Build a row from raw OHLCV values, deriving the computed fields.
    pub fn derive(
        symbol: impl Into<String>,
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            open,
            high,
            low,
            close,
            volume,
            price_change: close - open,
            high_low_spread: high - low,
        }
    }

    /// Returns true if any price field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Sanity check: prices present and `high >= low`.
    pub fn is_sane(&self) -> bool {
        !self.is_void() && self.high >= self.low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> PriceRow {
        PriceRow::derive(
            "NINTENDO",
            NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            7_500.0,
            7_620.0,
            7_480.0,
            7_600.0,
            3_200_000,
        )
    }

    #[test]
    fn derive_computes_change_and_spread() {
        let row = sample_row();
        assert_eq!(row.price_change, 100.0);
        assert_eq!(row.high_low_spread, 140.0);
    }

    #[test]
    fn row_is_sane() {
        assert!(sample_row().is_sane());
    }

    #[test]
    fn row_detects_void_and_inverted() {
        let mut row = sample_row();
        row.close = f64::NAN;
        assert!(row.is_void());
        assert!(!row.is_sane());

        let mut row = sample_row();
        row.high = 7_000.0;
        assert!(!row.is_sane());
    }
}
