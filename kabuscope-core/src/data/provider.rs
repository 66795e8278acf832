//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over remote sources (Yahoo Finance, the
//! synthetic generator) so the assembly loop can be driven by a stub in tests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw daily OHLCV bar from a data provider, before tagging with a display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl RawBar {
    /// Returns true if any price field is NaN (provider sent a partial row).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }
}

/// Structured error types for data operations.
///
/// Displayable in both CLI and TUI contexts; a per-symbol failure is reported
/// through its `Display` text.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("provider returned no bars for {symbol}")]
    EmptyResponse { symbol: String },

    #[error("HTTP {status} for {symbol}")]
    Http { status: u16, symbol: String },

    #[error("failed to read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("failed to parse CSV: {0}")]
    Parse(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Result of a successful data fetch for a single ticker.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub ticker: String,
    pub bars: Vec<RawBar>,
    pub source: DataSource,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    Synthetic,
}

impl DataSource {
    pub fn label(self) -> &'static str {
        match self {
            DataSource::YahooFinance => "Yahoo Finance",
            DataSource::Synthetic => "synthetic",
        }
    }
}

/// Trait for remote daily-bar providers.
///
/// A fetch either returns the bars for the window or fails; an empty window is
/// reported as [`DataError::EmptyResponse`], distinct from a transport failure.
/// The fetch cache sits above this trait; providers don't know about it.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily OHLCV bars for a ticker over `[start, end)`.
    fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate)
        -> Result<FetchResult, DataError>;
}

/// Progress callback for multi-symbol fetches.
pub trait DownloadProgress {
    /// Called when starting to fetch a symbol.
    fn on_start(&self, name: &str, index: usize, total: usize);

    /// Called when a symbol fetch completes.
    fn on_complete(&self, name: &str, index: usize, total: usize, result: &Result<(), DataError>);

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl DownloadProgress for StdoutProgress {
    fn on_start(&self, name: &str, index: usize, total: usize) {
        println!("[{}/{}] Fetching {name}...", index + 1, total);
    }

    fn on_complete(&self, name: &str, _index: usize, _total: usize, result: &Result<(), DataError>) {
        match result {
            Ok(()) => println!("  OK: {name}"),
            Err(e) => println!("  FAIL: {name}: {e}"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        println!("\nFetch complete: {succeeded}/{total} succeeded, {failed} failed");
    }
}

/// Progress sink that ignores every event.
pub struct NoProgress;

impl DownloadProgress for NoProgress {
    fn on_start(&self, _name: &str, _index: usize, _total: usize) {}

    fn on_complete(&self, _name: &str, _index: usize, _total: usize, _result: &Result<(), DataError>) {
    }

    fn on_batch_complete(&self, _succeeded: usize, _failed: usize, _total: usize) {}
}
