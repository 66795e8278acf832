//! Universe configuration: the ordered display-name to ticker mapping and the
//! fixed fetch window.
//!
//! Stored as TOML:
//!
//! ```toml
//! start = "2023-04-01"
//! end = "2025-04-27"
//!
//! [[companies]]
//! name = "SONY"
//! ticker = "6758.T"
//! ```

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::remote::FetchKey;

pub const UNIVERSE_FILE_NAME: &str = "universe.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read universe file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("parse universe TOML: {0}")]
    Parse(String),

    #[error("serialize universe: {0}")]
    Serialize(String),

    #[error("universe has no companies")]
    Empty,

    #[error("duplicate company name '{0}'")]
    DuplicateName(String),
}

/// One company: the name shown to the user and its exchange ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    pub ticker: String,
}

impl Company {
    pub fn new(name: impl Into<String>, ticker: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ticker: ticker.into(),
        }
    }
}

/// Companies to fetch and the window `[start, end)` to fetch them over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub companies: Vec<Company>,
}

impl UniverseConfig {
    /// Load a universe from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Resolve the universe to use: `explicit` when given, else
    /// `config_dir/universe.toml` when that file exists, else the default.
    pub fn discover(explicit: Option<&Path>, config_dir: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match config_dir.map(|dir| dir.join(UNIVERSE_FILE_NAME)) {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::tokyo_default()),
        }
    }

    /// Parse and validate a universe from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let universe: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        universe.validate()?;
        Ok(universe)
    }

    /// Serialize the universe to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// At least one company, unique display names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.companies.is_empty() {
            return Err(ConfigError::Empty);
        }
        let mut seen = std::collections::HashSet::new();
        for company in &self.companies {
            if !seen.insert(company.name.as_str()) {
                return Err(ConfigError::DuplicateName(company.name.clone()));
            }
        }
        Ok(())
    }

    /// The ten major Tokyo-listed companies over 2023-04-01 .. 2025-04-27.
    pub fn tokyo_default() -> Self {
        let companies = [
            ("SONY", "6758.T"),
            ("TOYOTA", "7203.T"),
            ("HONDA", "7267.T"),
            ("MITSUBISHI CORP", "8058.T"),
            ("NISSAN MOTOR CORP", "7201.T"),
            ("NIPPON STEEL CORP", "5401.T"),
            ("HITACHI", "6501.T"),
            ("NINTENDO", "7974.T"),
            ("FUJITSU", "6702.T"),
            ("JAPAN AIRLINES", "9201.T"),
        ]
        .into_iter()
        .map(|(name, ticker)| Company::new(name, ticker))
        .collect();

        Self {
            start: NaiveDate::from_ymd_opt(2023, 4, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2025, 4, 27).unwrap_or_default(),
            companies,
        }
    }

    /// Display names in configured order.
    pub fn names(&self) -> Vec<&str> {
        self.companies.iter().map(|c| c.name.as_str()).collect()
    }

    /// Tickers in configured order.
    pub fn tickers(&self) -> Vec<&str> {
        self.companies.iter().map(|c| c.ticker.as_str()).collect()
    }

    /// Look up a ticker by display name.
    pub fn ticker_for(&self, name: &str) -> Option<&str> {
        self.companies
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.ticker.as_str())
    }

    /// Cache key for fetching this universe.
    pub fn fetch_key(&self) -> FetchKey {
        FetchKey::new(
            self.companies.iter().map(|c| c.ticker.clone()).collect(),
            self.start,
            self.end,
        )
    }
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self::tokyo_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_universe_has_ten_companies_in_order() {
        let u = UniverseConfig::tokyo_default();
        assert_eq!(u.companies.len(), 10);
        assert_eq!(u.names()[0], "SONY");
        assert_eq!(u.names()[9], "JAPAN AIRLINES");
        assert_eq!(u.ticker_for("NINTENDO"), Some("7974.T"));
        assert_eq!(u.start, NaiveDate::from_ymd_opt(2023, 4, 1).unwrap());
        assert_eq!(u.end, NaiveDate::from_ymd_opt(2025, 4, 27).unwrap());
    }

    #[test]
    fn toml_roundtrip() {
        let u = UniverseConfig::tokyo_default();
        let toml_str = u.to_toml().unwrap();
        let parsed = UniverseConfig::from_toml(&toml_str).unwrap();
        assert_eq!(u, parsed);
    }

    #[test]
    fn parses_handwritten_file() {
        let content = r#"
            start = "2024-01-01"
            end = "2024-07-01"

            [[companies]]
            name = "NINTENDO"
            ticker = "7974.T"

            [[companies]]
            name = "SONY"
            ticker = "6758.T"
        "#;
        let u = UniverseConfig::from_toml(content).unwrap();
        assert_eq!(u.tickers(), vec!["7974.T", "6758.T"]);
    }

    #[test]
    fn rejects_empty_and_duplicate_universes() {
        let empty = r#"
            start = "2024-01-01"
            end = "2024-07-01"
            companies = []
        "#;
        assert!(matches!(
            UniverseConfig::from_toml(empty),
            Err(ConfigError::Empty)
        ));

        let dup = r#"
            start = "2024-01-01"
            end = "2024-07-01"

            [[companies]]
            name = "SONY"
            ticker = "6758.T"

            [[companies]]
            name = "SONY"
            ticker = "6758.T"
        "#;
        assert!(matches!(
            UniverseConfig::from_toml(dup),
            Err(ConfigError::DuplicateName(_))
        ));
    }

    #[test]
    fn discover_prefers_explicit_then_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            UniverseConfig::discover(None, Some(dir.path())).unwrap(),
            UniverseConfig::tokyo_default()
        );

        let mut small = UniverseConfig::tokyo_default();
        small.companies.truncate(2);
        std::fs::write(dir.path().join(UNIVERSE_FILE_NAME), small.to_toml().unwrap()).unwrap();
        assert_eq!(UniverseConfig::discover(None, Some(dir.path())).unwrap(), small);

        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            UniverseConfig::discover(Some(&missing), Some(dir.path())),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn fetch_key_follows_ticker_order_and_window() {
        let u = UniverseConfig::tokyo_default();
        let key = u.fetch_key();
        assert_eq!(key.tickers.len(), 10);
        assert_eq!(key.tickers[7], "7974.T");
        assert_eq!(key.start, u.start);
    }
}
