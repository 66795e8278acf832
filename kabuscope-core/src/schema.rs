//! Canonical column names and the checks the transform relies on.

use polars::prelude::*;

use crate::data::DatasetError;

pub const DATE: &str = "Date";
pub const SYMBOL: &str = "Symbol";
pub const OPEN: &str = "Open";
pub const HIGH: &str = "High";
pub const LOW: &str = "Low";
pub const CLOSE: &str = "Close";
pub const VOLUME: &str = "Volume";
pub const PRICE_CHANGE: &str = "Price_change";
pub const HIGH_LOW_SPREAD: &str = "High_Low_Spread";

/// Column layout of a remotely assembled dataset.
pub struct PriceSchema;

impl PriceSchema {
    /// Columns of the remote assembly before the transform runs.
    pub const RAW_COLUMNS: [&'static str; 7] = [DATE, SYMBOL, OPEN, HIGH, LOW, CLOSE, VOLUME];

    /// Columns the transform needs to derive `Price_change` and `High_Low_Spread`.
    pub const PRICE_COLUMNS: [&'static str; 4] = [OPEN, HIGH, LOW, CLOSE];

    /// The canonical schema after the transform.
    pub fn schema() -> Schema {
        Schema::from_iter(vec![
            Field::new(DATE.into(), DataType::Date),
            Field::new(SYMBOL.into(), DataType::String),
            Field::new(OPEN.into(), DataType::Float64),
            Field::new(HIGH.into(), DataType::Float64),
            Field::new(LOW.into(), DataType::Float64),
            Field::new(CLOSE.into(), DataType::Float64),
            Field::new(VOLUME.into(), DataType::Int64),
            Field::new(PRICE_CHANGE.into(), DataType::Float64),
            Field::new(HIGH_LOW_SPREAD.into(), DataType::Float64),
        ])
    }

    /// Fail with the first missing price column, if any.
    pub fn require_prices(df: &DataFrame) -> Result<(), DatasetError> {
        let actual = df.schema();
        for name in Self::PRICE_COLUMNS {
            if !actual.contains(name) {
                return Err(DatasetError::MissingColumn(name.to_string()));
            }
        }
        Ok(())
    }

    /// True when the frame has a `Date` column already typed as a calendar date.
    pub fn has_typed_dates(df: &DataFrame) -> bool {
        matches!(df.schema().get(DATE), Some(DataType::Date))
    }
}
