//! Close-price line chart model shared by the PNG renderer and the terminal chart.

use chrono::NaiveDate;
use polars::prelude::*;

use super::RenderError;
use crate::data::Dataset;
use crate::domain::{date_from_epoch_days, ChartMode};
use crate::schema::{PriceSchema, CLOSE, DATE};

pub const X_AXIS_LABEL: &str = "Date";
pub const Y_AXIS_LABEL: &str = "Close Price";

/// One point of the close-price series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Everything needed to draw the close-price chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub mode: ChartMode,
    /// Ascending by date; rows sharing a date keep dataset order.
    pub points: Vec<ChartPoint>,
}

impl ChartSpec {
    /// Build the chart for a filtered dataset.
    ///
    /// Rows with a null date or close are skipped. A dataset without a typed
    /// `Date` column or without `Close` gives an empty chart.
    pub fn from_dataset(
        dataset: &Dataset,
        mode: ChartMode,
        symbol: Option<&str>,
    ) -> Result<Self, RenderError> {
        Ok(Self {
            title: Self::title_for(mode, symbol),
            x_label: X_AXIS_LABEL,
            y_label: Y_AXIS_LABEL,
            mode,
            points: close_series(dataset)?,
        })
    }

    pub fn title_for(mode: ChartMode, symbol: Option<&str>) -> String {
        match (mode, symbol) {
            (ChartMode::Interactive, _) => "Stock Price Over Time (Interactive)".to_string(),
            (ChartMode::Static, Some(symbol)) => format!("{symbol} Stock Price Over Time"),
            (ChartMode::Static, None) => "Stock Price Over Time".to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    /// `(days since the first point, close)` pairs for numeric plotting.
    pub fn xy(&self) -> Vec<(f64, f64)> {
        self.xy_range(0, self.points.len())
    }

    /// Like [`ChartSpec::xy`] for the points in `from..to`.
    pub fn xy_range(&self, from: usize, to: usize) -> Vec<(f64, f64)> {
        let Some(origin) = self.first_date() else {
            return Vec::new();
        };
        let to = to.min(self.points.len());
        let from = from.min(to);
        self.points[from..to]
            .iter()
            .map(|p| ((p.date - origin).num_days() as f64, p.close))
            .collect()
    }

    /// Date at `x` days after the first point.
    pub fn date_at(&self, x: f64) -> Option<NaiveDate> {
        let origin = self.first_date()?;
        origin.checked_add_signed(chrono::Duration::days(x.round() as i64))
    }

    /// Min/max close over `from..to`, padded by 5% (or 1.0 for a flat series).
    pub fn y_bounds(&self, from: usize, to: usize) -> (f64, f64) {
        let to = to.min(self.points.len());
        let from = from.min(to);
        let (lo, hi) = self.points[from..to]
            .iter()
            .map(|p| p.close)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if !lo.is_finite() || !hi.is_finite() {
            return (0.0, 1.0);
        }
        let range = hi - lo;
        let pad = if range > 0.0 { range * 0.05 } else { 1.0 };
        (lo - pad, hi + pad)
    }
}

fn close_series(dataset: &Dataset) -> Result<Vec<ChartPoint>, RenderError> {
    let frame = dataset.frame();
    if !PriceSchema::has_typed_dates(frame) || !dataset.has_column(CLOSE) {
        return Ok(Vec::new());
    }

    let days = read_column(frame, DATE, &DataType::Int32)?;
    let closes = read_column(frame, CLOSE, &DataType::Float64)?;
    let days = days.i32().map_err(|e| column_error(DATE, e))?;
    let closes = closes.f64().map_err(|e| column_error(CLOSE, e))?;

    let mut points: Vec<ChartPoint> = days
        .into_iter()
        .zip(closes)
        .filter_map(|(day, close)| {
            Some(ChartPoint {
                date: date_from_epoch_days(day?)?,
                close: close.filter(|c| c.is_finite())?,
            })
        })
        .collect();
    points.sort_by_key(|p| p.date);
    Ok(points)
}

fn read_column(frame: &DataFrame, name: &str, dtype: &DataType) -> Result<Column, RenderError> {
    frame
        .column(name)
        .and_then(|c| c.cast(dtype))
        .map_err(|e| column_error(name, e))
}

fn column_error(column: &str, e: PolarsError) -> RenderError {
    RenderError::Column {
        column: column.to_string(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RawBar;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn dataset(closes: &[(u32, f64)]) -> Dataset {
        let bars = closes
            .iter()
            .map(|&(day, close)| RawBar {
                date: d(day),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1,
            })
            .collect();
        Dataset::from_tagged_bars(&[("NINTENDO".into(), bars)]).unwrap()
    }

    #[test]
    fn titles_follow_mode_and_symbol() {
        assert_eq!(
            ChartSpec::title_for(ChartMode::Static, Some("NINTENDO")),
            "NINTENDO Stock Price Over Time"
        );
        assert_eq!(
            ChartSpec::title_for(ChartMode::Static, None),
            "Stock Price Over Time"
        );
        assert_eq!(
            ChartSpec::title_for(ChartMode::Interactive, Some("NINTENDO")),
            "Stock Price Over Time (Interactive)"
        );
    }

    #[test]
    fn series_follows_rows() {
        let spec =
            ChartSpec::from_dataset(&dataset(&[(4, 10.0), (5, 12.0), (9, 11.0)]), ChartMode::Static, None)
                .unwrap();
        assert_eq!(spec.len(), 3);
        assert_eq!(spec.x_label, "Date");
        assert_eq!(spec.y_label, "Close Price");
        assert_eq!(spec.xy(), vec![(0.0, 10.0), (1.0, 12.0), (5.0, 11.0)]);
        assert_eq!(spec.date_at(5.0), Some(d(9)));
    }

    #[test]
    fn descending_rows_are_plotted_in_date_order() {
        let frame = df!(
            DATE => &[d(9), d(5), d(4)],
            CLOSE => &[11.0, 12.0, 10.0],
        )
        .unwrap();
        let spec =
            ChartSpec::from_dataset(&Dataset::new(frame, "desc"), ChartMode::Static, None).unwrap();
        assert_eq!(spec.first_date(), Some(d(4)));
        assert_eq!(spec.xy(), vec![(0.0, 10.0), (1.0, 12.0), (5.0, 11.0)]);
        assert!(spec.xy().iter().all(|&(x, _)| x >= 0.0));
    }

    #[test]
    fn y_bounds_pad_the_range() {
        let spec =
            ChartSpec::from_dataset(&dataset(&[(4, 100.0), (5, 200.0)]), ChartMode::Static, None)
                .unwrap();
        assert_eq!(spec.y_bounds(0, 2), (95.0, 205.0));
        assert_eq!(spec.y_bounds(0, 1), (99.0, 101.0));
    }

    #[test]
    fn empty_dataset_gives_empty_chart() {
        let spec = ChartSpec::from_dataset(&Dataset::empty(), ChartMode::Interactive, None).unwrap();
        assert!(spec.is_empty());
        assert!(spec.xy().is_empty());
        assert_eq!(spec.y_bounds(0, 0), (0.0, 1.0));
    }
}
