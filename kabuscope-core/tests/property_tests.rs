//! Property tests for the transform, filters, and export.
//!
//! 1. Derived columns: Price_change == Close - Open, High_Low_Spread == High - Low
//! 2. Date filter is inclusive at both bounds
//! 3. Filtering is idempotent
//! 4. Symbol filter keeps only the chosen symbol
//! 5. CSV export reads back to the same rows

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use kabuscope_core::data::{read_csv_bytes, Dataset, RawBar};
use kabuscope_core::export::to_csv_bytes;
use kabuscope_core::filter::{select, select_dates, select_symbol};
use kabuscope_core::transform::enrich;
use kabuscope_core::DateRange;

const NAMES: [&str; 3] = ["SONY", "NINTENDO", "HONDA"];

// ── Strategies ───────────────────────────────────────────────────────

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// Prices on a quarter-yen grid so every value survives text round trips exactly.
fn arb_price() -> impl Strategy<Value = f64> {
    (400u32..40_000).prop_map(|q| f64::from(q) / 4.0)
}

fn arb_bar(day: i64) -> impl Strategy<Value = RawBar> {
    (arb_price(), arb_price(), 0u32..400, 0u32..400, 0u64..10_000_000).prop_map(
        move |(open, close, up, down, volume)| RawBar {
            date: base_date() + Duration::days(day),
            open,
            high: open.max(close) + f64::from(up) / 4.0,
            low: open.min(close) - f64::from(down) / 4.0,
            close,
            volume,
        },
    )
}

/// One series per company, each with strictly increasing unique dates.
fn arb_series() -> impl Strategy<Value = Vec<(String, Vec<RawBar>)>> {
    prop::collection::vec(
        prop::collection::btree_set(0i64..120, 1..25),
        1..=NAMES.len(),
    )
    .prop_flat_map(|day_sets| {
        let per_company: Vec<_> = day_sets
            .into_iter()
            .map(|days| {
                days.into_iter()
                    .map(arb_bar)
                    .collect::<Vec<_>>()
            })
            .collect();
        per_company
    })
    .prop_map(|per_company| {
        per_company
            .into_iter()
            .enumerate()
            .map(|(i, bars)| (NAMES[i].to_string(), bars))
            .collect()
    })
}

fn enriched(series: &[(String, Vec<RawBar>)]) -> Dataset {
    enrich(&Dataset::from_tagged_bars(series).unwrap()).unwrap()
}

fn arb_range() -> impl Strategy<Value = DateRange> {
    (0i64..120, 0i64..120).prop_map(|(a, b)| {
        DateRange::new(base_date() + Duration::days(a), base_date() + Duration::days(b))
    })
}

// ── 1. Derived columns ───────────────────────────────────────────────

proptest! {
    #[test]
    fn derived_columns_match_prices(series in arb_series()) {
        let ds = enriched(&series);
        for row in ds.rows().unwrap() {
            prop_assert_eq!(row.price_change, row.close - row.open);
            prop_assert_eq!(row.high_low_spread, row.high - row.low);
            prop_assert!(row.high >= row.low);
        }
    }
}

// ── 2. Inclusive date filter ─────────────────────────────────────────

proptest! {
    #[test]
    fn date_filter_is_inclusive(series in arb_series(), range in arb_range()) {
        let ds = enriched(&series);
        let out = select_dates(&ds, range).unwrap();

        let kept = out.rows().unwrap();
        prop_assert!(kept.iter().all(|r| range.contains(r.date)));

        let expected = ds.rows().unwrap().into_iter().filter(|r| range.contains(r.date)).count();
        prop_assert_eq!(kept.len(), expected);
    }

    #[test]
    fn single_day_range_keeps_that_day(series in arb_series()) {
        let ds = enriched(&series);
        let first = ds.rows().unwrap()[0].date;
        let out = select_dates(&ds, DateRange::new(first, first)).unwrap();
        prop_assert!(out.rows().unwrap().iter().any(|r| r.date == first));
    }
}

// ── 3. Idempotence ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn filtering_is_idempotent(series in arb_series(), range in arb_range(), pick in 0usize..3) {
        let ds = enriched(&series);
        let symbol = NAMES[pick % series.len()];
        let once = select(&ds, Some(symbol), Some(range)).unwrap();
        let twice = select(&once, Some(symbol), Some(range)).unwrap();
        prop_assert!(once.frame().equals(twice.frame()));
    }
}

// ── 4. Symbol exclusivity ────────────────────────────────────────────

proptest! {
    #[test]
    fn symbol_filter_keeps_only_chosen(series in arb_series(), pick in 0usize..3) {
        let ds = enriched(&series);
        let symbol = NAMES[pick % series.len()];
        let out = select_symbol(&ds, symbol).unwrap();

        let rows = out.rows().unwrap();
        prop_assert!(rows.iter().all(|r| r.symbol == symbol));

        let expected = series.iter().find(|(name, _)| name == symbol).map(|(_, b)| b.len());
        prop_assert_eq!(Some(rows.len()), expected);
    }
}

// ── 5. CSV round trip ────────────────────────────────────────────────

proptest! {
    #[test]
    fn csv_export_reads_back(series in arb_series()) {
        let ds = enriched(&series);
        let bytes = to_csv_bytes(&ds).unwrap();
        let back = enrich(&read_csv_bytes(&bytes).unwrap()).unwrap();

        prop_assert_eq!(back.column_names(), ds.column_names());
        prop_assert_eq!(back.rows().unwrap(), ds.rows().unwrap());
    }
}
