//! Yahoo Finance data provider.
//!
//! Fetches daily OHLCV bars from Yahoo's v8 chart API. One request per ticker,
//! no retries: a failed symbol is reported and the assembly moves on.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.
//! The CSV upload path is the fallback when Yahoo is unavailable.

use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use tracing::debug;

use super::provider::{DataError, DataProvider, DataSource, FetchResult, RawBar};

const CHART_BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_CE_DAYS: i64 = 719_163;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds (Tokyo: 32400).
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new() -> Result<Self, DataError> {
        Self::with_base_url(CHART_BASE_URL)
    }

    /// Point the provider at a different chart endpoint (mirrors, proxies).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build the chart API URL for a ticker over `[start, end)`.
    fn chart_url(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/{ticker}?period1={}&period2={}&interval=1d",
            self.base_url,
            unix_midnight(start),
            unix_midnight(end),
        )
    }

    /// Parse the chart API response into RawBars.
    fn parse_response(ticker: &str, resp: ChartResponse) -> Result<Vec<RawBar>, DataError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            },
            Some(err) => {
                DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let offset = data.meta.as_ref().map(|m| m.gmtoffset).unwrap_or(0);

        // A window with no sessions comes back without timestamps.
        let Some(timestamps) = data.timestamp else {
            return Err(DataError::EmptyResponse {
                symbol: ticker.to_string(),
            });
        };

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            // Session timestamps are UTC; shift to the exchange's local date.
            let date = chrono::DateTime::from_timestamp(ts + offset, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            // Holidays and halted sessions arrive as all-null rows
            if open.is_none()
                && high.is_none()
                && low.is_none()
                && close.is_none()
                && volume.is_none()
            {
                continue;
            }

            bars.push(RawBar {
                date,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close: close.unwrap_or(f64::NAN),
                volume: volume.unwrap_or(0),
            });
        }

        if bars.is_empty() {
            return Err(DataError::EmptyResponse {
                symbol: ticker.to_string(),
            });
        }

        Ok(bars)
    }

    fn request(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<RawBar>, DataError> {
        let url = self.chart_url(ticker, start, end);
        debug!(%url, "requesting chart");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(DataError::RateLimited {
                retry_after_secs: retry_after,
            });
        }
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(DataError::AuthenticationRequired(format!(
                "Yahoo Finance refused {ticker} (HTTP {})",
                status.as_u16()
            )));
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            // The 404 body still carries the chart error envelope.
            return match resp.json::<ChartResponse>() {
                Ok(chart) => Self::parse_response(ticker, chart),
                Err(_) => Err(DataError::SymbolNotFound {
                    symbol: ticker.to_string(),
                }),
            };
        }
        if !status.is_success() {
            return Err(DataError::Http {
                status: status.as_u16(),
                symbol: ticker.to_string(),
            });
        }

        let chart: ChartResponse = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {ticker}: {e}"))
        })?;

        Self::parse_response(ticker, chart)
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<FetchResult, DataError> {
        let bars = self.request(ticker, start, end)?;
        Ok(FetchResult {
            ticker: ticker.to_string(),
            bars,
            source: DataSource::YahooFinance,
        })
    }
}

/// Unix timestamp of 00:00 UTC on `date`.
fn unix_midnight(date: NaiveDate) -> i64 {
    (i64::from(date.num_days_from_ce()) - UNIX_EPOCH_CE_DAYS) * 86_400
}
