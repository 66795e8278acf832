//! Selection state, rebuilt from user input on every interaction, never persisted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inclusive calendar-date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, swapping the bounds if they arrive reversed.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Inclusive at both ends.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Clamp both bounds into `bounds` (the observed min/max of a dataset).
    pub fn clamp_to(&self, bounds: DateRange) -> DateRange {
        // Fields are public; re-normalize so `clamp` never sees min > max.
        let bounds = DateRange::new(bounds.start, bounds.end);
        let start = self.start.clamp(bounds.start, bounds.end);
        let end = self.end.clamp(bounds.start, bounds.end);
        DateRange::new(start, end)
    }

    /// Number of calendar days covered, counting both ends.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} .. {}", self.start, self.end)
    }
}

/// How the close-price chart is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChartMode {
    /// Fixed line chart over the whole filtered range.
    #[default]
    Static,
    /// Line chart with a draggable range slider under the x-axis.
    Interactive,
}

impl ChartMode {
    pub fn label(self) -> &'static str {
        match self {
            ChartMode::Static => "Static",
            ChartMode::Interactive => "Interactive",
        }
    }

    pub fn toggle(self) -> ChartMode {
        match self {
            ChartMode::Static => ChartMode::Interactive,
            ChartMode::Interactive => ChartMode::Static,
        }
    }
}

/// User selection applied on top of a loaded dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Single company; `None` picks the first available symbol.
    pub chosen_symbol: Option<String>,
    /// Requested range; `None` means the full observed range.
    pub date_range: Option<DateRange>,
    pub chart_mode: ChartMode,
    /// Whether the full tabular dump of the filtered subset is requested.
    pub show_table: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn new_swaps_reversed_bounds() {
        let r = DateRange::new(d(2024, 2, 1), d(2024, 1, 1));
        assert_eq!(r.start, d(2024, 1, 1));
        assert_eq!(r.end, d(2024, 2, 1));
    }

    #[test]
    fn contains_is_inclusive() {
        let r = DateRange::new(d(2024, 1, 1), d(2024, 1, 31));
        assert!(r.contains(d(2024, 1, 1)));
        assert!(r.contains(d(2024, 1, 31)));
        assert!(!r.contains(d(2024, 2, 1)));
        assert!(!r.contains(d(2023, 12, 31)));
    }

    #[test]
    fn clamp_pulls_bounds_inside() {
        let bounds = DateRange::new(d(2023, 4, 3), d(2025, 4, 25));
        let wide = DateRange::new(d(2020, 1, 1), d(2030, 1, 1));
        assert_eq!(wide.clamp_to(bounds), bounds);

        let inside = DateRange::new(d(2024, 1, 1), d(2024, 1, 31));
        assert_eq!(inside.clamp_to(bounds), inside);
    }

    #[test]
    fn clamp_range_entirely_outside_collapses_to_edge() {
        let bounds = DateRange::new(d(2024, 1, 1), d(2024, 12, 31));
        let before = DateRange::new(d(2020, 1, 1), d(2020, 6, 1));
        let clamped = before.clamp_to(bounds);
        assert_eq!(clamped.start, d(2024, 1, 1));
        assert_eq!(clamped.end, d(2024, 1, 1));
    }

    #[test]
    fn chart_mode_toggles() {
        assert_eq!(ChartMode::Static.toggle(), ChartMode::Interactive);
        assert_eq!(ChartMode::Interactive.toggle(), ChartMode::Static);
        assert_eq!(ChartMode::default(), ChartMode::Static);
    }

    #[test]
    fn days_counts_both_ends() {
        assert_eq!(DateRange::new(d(2024, 1, 1), d(2024, 1, 31)).days(), 31);
    }
}
