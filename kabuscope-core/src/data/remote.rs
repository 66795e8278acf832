//! Remote assembly: fetch every company in the universe and stack the results.
//!
//! Each company is fetched independently. A failure is recorded and reported
//! but never aborts the batch; the dataset holds whatever succeeded.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::dataset::{Dataset, DatasetError};
use super::provider::{DataError, DataProvider, DownloadProgress, FetchResult, RawBar};
use super::universe::UniverseConfig;

/// Identity of one remote assembly: which tickers over which window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchKey {
    pub tickers: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchKey {
    pub fn new(tickers: Vec<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self { tickers, start, end }
    }

    /// Short stable digest for logs.
    pub fn digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for ticker in &self.tickers {
            hasher.update(ticker.as_bytes());
            hasher.update(b",");
        }
        hasher.update(self.start.to_string().as_bytes());
        hasher.update(self.end.to_string().as_bytes());
        let hex = hasher.finalize().to_hex();
        hex.as_str()[..12].to_string()
    }
}

/// Per-company result of a fetch.
#[derive(Debug)]
pub enum FetchOutcome {
    Fetched(FetchResult),
    Failed(DataError),
}

/// A company that could not be loaded, with the reason as displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolFailure {
    pub name: String,
    pub ticker: String,
    pub reason: String,
}

impl SymbolFailure {
    /// The warning shown to the user for this failure.
    pub fn message(&self) -> String {
        format!("Failed to load {}: {}", self.name, self.reason)
    }
}

/// The assembled dataset plus the companies that failed.
#[derive(Debug, Clone)]
pub struct PartialDataset {
    pub dataset: Dataset,
    pub failures: Vec<SymbolFailure>,
    pub succeeded: usize,
}

impl PartialDataset {
    /// True when no company loaded.
    pub fn is_total_failure(&self) -> bool {
        self.succeeded == 0
    }

    /// One warning per failed company, in universe order.
    pub fn warnings(&self) -> Vec<String> {
        self.failures.iter().map(SymbolFailure::message).collect()
    }

    pub fn summary(&self) -> FetchSummary {
        FetchSummary {
            total: self.succeeded + self.failures.len(),
            succeeded: self.succeeded,
            failed: self.failures.len(),
        }
    }
}

/// Counts for a batch fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FetchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl std::fmt::Display for FetchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} loaded, {} failed",
            self.succeeded, self.total, self.failed
        )
    }
}

/// Fetch every company in `universe` and stack the successes in universe order.
///
/// Rows with a missing price are dropped; a repeated date within one company
/// keeps its first bar.
pub fn fetch_universe(
    provider: &dyn DataProvider,
    universe: &UniverseConfig,
    progress: &dyn DownloadProgress,
) -> Result<PartialDataset, DatasetError> {
    let total = universe.companies.len();
    let mut series: Vec<(String, Vec<RawBar>)> = Vec::with_capacity(total);
    let mut failures = Vec::new();

    info!(
        provider = provider.name(),
        companies = total,
        start = %universe.start,
        end = %universe.end,
        "fetching universe"
    );

    for (i, company) in universe.companies.iter().enumerate() {
        progress.on_start(&company.name, i, total);

        let outcome = match provider.fetch(&company.ticker, universe.start, universe.end) {
            Ok(result) => FetchOutcome::Fetched(result),
            Err(e) => FetchOutcome::Failed(e),
        };

        match outcome {
            FetchOutcome::Fetched(result) => {
                let source = result.source.label();
                let bars = clean_bars(result.bars);
                if bars.is_empty() {
                    let err = DataError::EmptyResponse {
                        symbol: company.ticker.clone(),
                    };
                    progress.on_complete(&company.name, i, total, &Err(err));
                    warn!(company = %company.name, ticker = %company.ticker, "no usable bars");
                    failures.push(SymbolFailure {
                        name: company.name.clone(),
                        ticker: company.ticker.clone(),
                        reason: format!("provider returned no bars for {}", company.ticker),
                    });
                    continue;
                }
                debug!(company = %company.name, source, bars = bars.len(), "fetched");
                progress.on_complete(&company.name, i, total, &Ok(()));
                series.push((company.name.clone(), bars));
            }
            FetchOutcome::Failed(err) => {
                warn!(company = %company.name, ticker = %company.ticker, error = %err, "fetch failed");
                let reason = err.to_string();
                progress.on_complete(&company.name, i, total, &Err(err));
                failures.push(SymbolFailure {
                    name: company.name.clone(),
                    ticker: company.ticker.clone(),
                    reason,
                });
            }
        }
    }

    let succeeded = series.len();
    progress.on_batch_complete(succeeded, failures.len(), total);

    let dataset = Dataset::from_tagged_bars(&series)?;
    info!(
        rows = dataset.height(),
        succeeded,
        failed = failures.len(),
        "universe assembled"
    );

    Ok(PartialDataset {
        dataset,
        failures,
        succeeded,
    })
}

/// Drop void bars and later duplicates of a date, keeping provider order.
fn clean_bars(bars: Vec<RawBar>) -> Vec<RawBar> {
    let mut seen = std::collections::HashSet::new();
    bars.into_iter()
        .filter(|bar| !bar.is_void())
        .filter(|bar| seen.insert(bar.date))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::NoProgress;
    use crate::data::synthetic::SyntheticProvider;
    use crate::data::universe::Company;

    fn universe() -> UniverseConfig {
        UniverseConfig {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            companies: vec![
                Company::new("SONY", "6758.T"),
                Company::new("NINTENDO", "7974.T"),
                Company::new("JAPAN AIRLINES", "9201.T"),
            ],
        }
    }

    #[test]
    fn isolates_failed_company() {
        let provider = SyntheticProvider::new().without("7974.T");
        let partial = fetch_universe(&provider, &universe(), &NoProgress).unwrap();

        assert_eq!(partial.succeeded, 2);
        assert!(!partial.is_total_failure());
        assert_eq!(partial.failures.len(), 1);
        assert_eq!(partial.failures[0].name, "NINTENDO");
        assert_eq!(partial.summary().to_string(), "2/3 loaded, 1 failed");
        assert!(partial.warnings()[0].starts_with("Failed to load NINTENDO: "));
        assert_eq!(
            partial.dataset.symbols().unwrap(),
            vec!["SONY", "JAPAN AIRLINES"]
        );
    }

    #[test]
    fn total_failure_is_flagged() {
        let provider = SyntheticProvider::new()
            .without("6758.T")
            .without("7974.T")
            .without("9201.T");
        let partial = fetch_universe(&provider, &universe(), &NoProgress).unwrap();
        assert!(partial.is_total_failure());
        assert!(partial.dataset.is_empty());
        assert_eq!(partial.warnings().len(), 3);
    }

    #[test]
    fn clean_bars_drops_void_and_duplicate_dates() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 4).unwrap();
        let bar = |close: f64| RawBar {
            date: day,
            open: 1.0,
            high: 2.0,
            low: 0.5,
            close,
            volume: 10,
        };
        let mut void = bar(1.0);
        void.open = f64::NAN;

        let cleaned = clean_bars(vec![void, bar(1.5), bar(1.7)]);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].close, 1.5);
    }

    #[test]
    fn fetch_key_digest_is_stable() {
        let key = universe().fetch_key();
        assert_eq!(key.digest(), universe().fetch_key().digest());
        assert_eq!(key.digest().len(), 12);
    }
}
