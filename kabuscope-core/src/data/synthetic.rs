//! Offline provider producing deterministic random-walk bars.
//!
//! Seeded from the ticker, so the same ticker and window always give the same
//! bars. Used for demos without network access and for tests.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{DataError, DataProvider, DataSource, FetchResult, RawBar};

const START_PRICE: f64 = 1_000.0;

/// Synthetic daily bars on weekdays in `[start, end)`.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    /// Tickers that fail with `SymbolNotFound`, for exercising partial assembly.
    missing: Vec<String>,
}

impl SyntheticProvider {
    pub fn new() -> Self {
        Self {
            missing: Vec::new(),
        }
    }

    /// Make `ticker` unavailable.
    pub fn without(mut self, ticker: impl Into<String>) -> Self {
        self.missing.push(ticker.into());
        self
    }

    fn generate(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Vec<RawBar> {
        let seed: [u8; 32] = *blake3::hash(ticker.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let mut bars = Vec::new();
        let mut price = START_PRICE;
        let mut current = start;

        while current < end {
            if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                current += Duration::days(1);
                continue;
            }

            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000..5_000_000u64);

            bars.push(RawBar {
                date: current,
                open,
                high,
                low,
                close,
                volume,
            });

            price = close;
            current += Duration::days(1);
        }

        bars
    }
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<FetchResult, DataError> {
        if self.missing.iter().any(|t| t == ticker) {
            return Err(DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            });
        }

        let bars = self.generate(ticker, start, end);
        if bars.is_empty() {
            return Err(DataError::EmptyResponse {
                symbol: ticker.to_string(),
            });
        }

        Ok(FetchResult {
            ticker: ticker.to_string(),
            bars,
            source: DataSource::Synthetic,
        })
    }
}
