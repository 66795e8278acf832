//! Domain types for Kabuscope

pub mod price_row;
pub mod selection;

pub use price_row::PriceRow;
pub use selection::{ChartMode, DateRange, Selection};

/// Display name of a company, e.g. `NINTENDO`.
pub type Symbol = String;

/// Days between 0001-01-01 (day 1 of the common era) and 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Convert a calendar date into the day count polars uses for `Date` columns.
pub fn days_since_epoch(date: chrono::NaiveDate) -> i32 {
    use chrono::Datelike;
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Inverse of [`days_since_epoch`].
pub fn date_from_epoch_days(days: i32) -> Option<chrono::NaiveDate> {
    chrono::NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn epoch_is_day_zero() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(days_since_epoch(epoch), 0);
        assert_eq!(date_from_epoch_days(0), Some(epoch));
    }

    #[test]
    fn epoch_days_roundtrip() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(days_since_epoch(d), 19_753);
        assert_eq!(date_from_epoch_days(days_since_epoch(d)), Some(d));
    }
}
