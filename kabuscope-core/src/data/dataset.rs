//! Dataset: an ordered table of price observations with a content fingerprint.
//!
//! Backed by a polars `DataFrame` so uploaded files may carry arbitrary columns.
//! Remote assemblies use the canonical layout from [`crate::schema`].
//!
//! The fingerprint is the dataset's identity: it is computed once from the
//! source content (bars or file bytes) and every derived dataset (transform,
//! filter) gets a fingerprint derived from its parent plus the operation, so
//! identical inputs always produce identical fingerprints without rehashing rows.

use std::collections::HashSet;

use polars::prelude::*;
use thiserror::Error;

use super::provider::RawBar;
use crate::domain::{date_from_epoch_days, days_since_epoch, DateRange, PriceRow};
use crate::schema::{
    PriceSchema, CLOSE, DATE, HIGH, HIGH_LOW_SPREAD, LOW, OPEN, PRICE_CHANGE, SYMBOL, VOLUME,
};

/// Errors from reading or reshaping a dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("invalid value in column '{column}' at row {row}")]
    InvalidValue { column: String, row: usize },

    #[error("dataframe error: {0}")]
    Polars(#[from] PolarsError),
}

/// Ordered collection of rows plus its identity.
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
    fingerprint: String,
}

impl Dataset {
    pub fn new(frame: DataFrame, fingerprint: impl Into<String>) -> Self {
        Self {
            frame,
            fingerprint: fingerprint.into(),
        }
    }

    /// A dataset with no columns and no rows.
    pub fn empty() -> Self {
        Self::new(DataFrame::empty(), blake3::hash(b"empty").to_hex().to_string())
    }

    /// Assemble a dataset from per-company bar series, in the given order.
    ///
    /// Each row is tagged with the company's display name in `Symbol`.
    pub fn from_tagged_bars(series: &[(String, Vec<RawBar>)]) -> Result<Self, DatasetError> {
        let total: usize = series.iter().map(|(_, bars)| bars.len()).sum();
        let mut dates = Vec::with_capacity(total);
        let mut symbols = Vec::with_capacity(total);
        let mut opens = Vec::with_capacity(total);
        let mut highs = Vec::with_capacity(total);
        let mut lows = Vec::with_capacity(total);
        let mut closes = Vec::with_capacity(total);
        let mut volumes = Vec::with_capacity(total);

        for (name, bars) in series {
            for bar in bars {
                dates.push(days_since_epoch(bar.date));
                symbols.push(name.clone());
                opens.push(bar.open);
                highs.push(bar.high);
                lows.push(bar.low);
                closes.push(bar.close);
                volumes.push(i64::try_from(bar.volume).unwrap_or(i64::MAX));
            }
        }

        let frame = DataFrame::new(vec![
            Column::new(DATE.into(), dates).cast(&DataType::Date)?,
            Column::new(SYMBOL.into(), symbols),
            Column::new(OPEN.into(), opens),
            Column::new(HIGH.into(), highs),
            Column::new(LOW.into(), lows),
            Column::new(CLOSE.into(), closes),
            Column::new(VOLUME.into(), volumes),
        ])?;

        Ok(Self::new(frame, bars_fingerprint(series)))
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    /// Content identity (BLAKE3 hex).
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Fingerprint for a dataset derived from this one by `operation`.
    pub fn derived_fingerprint(&self, operation: &str) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.fingerprint.as_bytes());
        hasher.update(b"|");
        hasher.update(operation.as_bytes());
        hasher.finalize().to_hex().to_string()
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.schema().contains(name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// Unique values of `Symbol` in first-seen order; empty when there is no such column.
    pub fn symbols(&self) -> Result<Vec<String>, DatasetError> {
        if !self.has_column(SYMBOL) {
            return Ok(Vec::new());
        }
        let column = self.column_as(SYMBOL, &DataType::String)?;
        let mut seen = HashSet::new();
        let mut symbols = Vec::new();
        for value in column.str()?.into_iter().flatten() {
            if seen.insert(value) {
                symbols.push(value.to_string());
            }
        }
        Ok(symbols)
    }

    /// Observed min/max of a typed `Date` column; `None` if absent or all null.
    pub fn date_bounds(&self) -> Result<Option<DateRange>, DatasetError> {
        if !PriceSchema::has_typed_dates(&self.frame) {
            return Ok(None);
        }
        let days = self.column_as(DATE, &DataType::Int32)?;
        let mut bounds: Option<(i32, i32)> = None;
        for day in days.i32()?.into_iter().flatten() {
            bounds = Some(match bounds {
                None => (day, day),
                Some((lo, hi)) => (lo.min(day), hi.max(day)),
            });
        }
        Ok(bounds.and_then(|(lo, hi)| {
            Some(DateRange::new(
                date_from_epoch_days(lo)?,
                date_from_epoch_days(hi)?,
            ))
        }))
    }

    /// Typed view of the rows.
    ///
    /// Requires `Date` and the four price columns. `Symbol` defaults to empty,
    /// `Volume` to zero, and the derived columns are computed when absent.
    pub fn rows(&self) -> Result<Vec<PriceRow>, DatasetError> {
        let dates = self.column_as(DATE, &DataType::Int32)?;
        let opens = self.column_as(OPEN, &DataType::Float64)?;
        let highs = self.column_as(HIGH, &DataType::Float64)?;
        let lows = self.column_as(LOW, &DataType::Float64)?;
        let closes = self.column_as(CLOSE, &DataType::Float64)?;
        let symbols = self.optional_column_as(SYMBOL, &DataType::String)?;
        let volumes = self.optional_column_as(VOLUME, &DataType::Int64)?;
        let changes = self.optional_column_as(PRICE_CHANGE, &DataType::Float64)?;
        let spreads = self.optional_column_as(HIGH_LOW_SPREAD, &DataType::Float64)?;

        let dates = dates.i32()?;
        let opens = opens.f64()?;
        let highs = highs.f64()?;
        let lows = lows.f64()?;
        let closes = closes.f64()?;
        let symbols = symbols.as_ref().map(|c| c.str()).transpose()?;
        let volumes = volumes.as_ref().map(|c| c.i64()).transpose()?;
        let changes = changes.as_ref().map(|c| c.f64()).transpose()?;
        let spreads = spreads.as_ref().map(|c| c.f64()).transpose()?;

        let n = self.frame.height();
        let mut rows = Vec::with_capacity(n);
        for i in 0..n {
            let date = dates
                .get(i)
                .and_then(date_from_epoch_days)
                .ok_or_else(|| DatasetError::InvalidValue {
                    column: DATE.to_string(),
                    row: i,
                })?;
            let open = opens.get(i).unwrap_or(f64::NAN);
            let high = highs.get(i).unwrap_or(f64::NAN);
            let low = lows.get(i).unwrap_or(f64::NAN);
            let close = closes.get(i).unwrap_or(f64::NAN);

            rows.push(PriceRow {
                symbol: symbols
                    .and_then(|s| s.get(i))
                    .unwrap_or_default()
                    .to_string(),
                date,
                open,
                high,
                low,
                close,
                volume: volumes
                    .and_then(|v| v.get(i))
                    .map(|v| v.max(0) as u64)
                    .unwrap_or(0),
                price_change: changes
                    .and_then(|c| c.get(i))
                    .unwrap_or(close - open),
                high_low_spread: spreads.and_then(|s| s.get(i)).unwrap_or(high - low),
            });
        }
        Ok(rows)
    }

    fn column_as(&self, name: &str, dtype: &DataType) -> Result<Column, DatasetError> {
        let column = self
            .frame
            .column(name)
            .map_err(|_| DatasetError::MissingColumn(name.to_string()))?;
        Ok(column.cast(dtype)?)
    }

    fn optional_column_as(
        &self,
        name: &str,
        dtype: &DataType,
    ) -> Result<Option<Column>, DatasetError> {
        if self.has_column(name) {
            self.column_as(name, dtype).map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Deterministic BLAKE3 hash over tagged bar series, in series order.
fn bars_fingerprint(series: &[(String, Vec<RawBar>)]) -> String {
    let mut hasher = blake3::Hasher::new();
    for (name, bars) in series {
        hasher.update(name.as_bytes());
        for bar in bars {
            hasher.update(&days_since_epoch(bar.date).to_le_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}
