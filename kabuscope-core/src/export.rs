//! CSV export of the filtered subset.
//!
//! Output is UTF-8 with a header row, no index column, and dates written as
//! `YYYY-MM-DD`. Serialized bytes are memoized by dataset fingerprint so a
//! re-render without data changes reuses them.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;

use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::data::Dataset;

/// File name offered for the download.
pub const EXPORT_FILE_NAME: &str = "filtered_stock_data.csv";
pub const EXPORT_MIME: &str = "text/csv";

/// Entries kept by [`ExportCache`] before the oldest is evicted.
const EXPORT_CACHE_CAPACITY: usize = 16;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize CSV: {0}")]
    Csv(#[from] PolarsError),

    #[error("failed to write {path}: {reason}")]
    Write { path: String, reason: String },
}

/// Serialize a dataset to CSV bytes.
pub fn to_csv_bytes(dataset: &Dataset) -> Result<Vec<u8>, ExportError> {
    let mut frame = dataset.frame().clone();
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .finish(&mut frame)?;
    debug!(rows = frame.height(), bytes = buf.len(), "serialized CSV");
    Ok(buf)
}

/// A downloadable file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime: String,
    pub bytes: Arc<[u8]>,
}

impl ExportArtifact {
    pub fn csv(bytes: Arc<[u8]>) -> Self {
        Self {
            file_name: EXPORT_FILE_NAME.to_string(),
            mime: EXPORT_MIME.to_string(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write the bytes to `dir/file_name`, returning the full path.
    pub fn write_into(&self, dir: &Path) -> Result<std::path::PathBuf, ExportError> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes[..]).map_err(|e| ExportError::Write {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        info!(path = %path.display(), bytes = self.bytes.len(), "export written");
        Ok(path)
    }
}

/// Serialized CSV bytes keyed by dataset fingerprint.
#[derive(Debug, Default)]
pub struct ExportCache {
    entries: HashMap<String, Arc<[u8]>>,
    order: VecDeque<String>,
    serializations: u64,
}

impl ExportCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The CSV artifact for `dataset`, serializing only on first sight of its fingerprint.
    pub fn artifact(&mut self, dataset: &Dataset) -> Result<ExportArtifact, ExportError> {
        if let Some(bytes) = self.entries.get(dataset.fingerprint()) {
            return Ok(ExportArtifact::csv(Arc::clone(bytes)));
        }

        let bytes: Arc<[u8]> = to_csv_bytes(dataset)?.into();
        self.serializations += 1;

        if self.order.len() >= EXPORT_CACHE_CAPACITY {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        let key = dataset.fingerprint().to_string();
        self.order.push_back(key.clone());
        self.entries.insert(key, Arc::clone(&bytes));

        Ok(ExportArtifact::csv(bytes))
    }

    /// How many times bytes were actually serialized.
    pub fn serializations(&self) -> u64 {
        self.serializations
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RawBar;
    use chrono::NaiveDate;

    fn dataset(close: f64) -> Dataset {
        Dataset::from_tagged_bars(&[(
            "NINTENDO".into(),
            vec![RawBar {
                date: NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
                open: 7500.0,
                high: 7550.0,
                low: 7450.0,
                close,
                volume: 1000,
            }],
        )])
        .unwrap()
    }

    #[test]
    fn csv_has_header_and_iso_dates() {
        let bytes = to_csv_bytes(&dataset(7520.0)).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Date,Symbol,Open,High,Low,Close,Volume"
        );
        assert!(lines.next().unwrap().starts_with("2024-01-04,NINTENDO,"));
    }

    #[test]
    fn empty_selection_exports_header_only() {
        let empty = crate::filter::select_symbol(&dataset(1.0), "SONY").unwrap();
        let text = String::from_utf8(to_csv_bytes(&empty).unwrap()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn artifact_metadata() {
        let mut cache = ExportCache::new();
        let artifact = cache.artifact(&dataset(7520.0)).unwrap();
        assert_eq!(artifact.file_name, "filtered_stock_data.csv");
        assert_eq!(artifact.mime, "text/csv");
        assert!(!artifact.is_empty());
    }

    #[test]
    fn cache_reuses_bytes_for_same_fingerprint() {
        let mut cache = ExportCache::new();
        let ds = dataset(7520.0);
        let a = cache.artifact(&ds).unwrap();
        let b = cache.artifact(&ds).unwrap();
        assert_eq!(cache.serializations(), 1);
        assert!(Arc::ptr_eq(&a.bytes, &b.bytes));

        cache.artifact(&dataset(7521.0)).unwrap();
        assert_eq!(cache.serializations(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn cache_evicts_oldest_beyond_capacity() {
        let mut cache = ExportCache::new();
        for i in 0..(EXPORT_CACHE_CAPACITY + 3) {
            cache.artifact(&dataset(i as f64)).unwrap();
        }
        assert_eq!(cache.len(), EXPORT_CACHE_CAPACITY);
    }

    #[test]
    fn write_into_uses_export_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = ExportCache::new().artifact(&dataset(7520.0)).unwrap();
        let path = artifact.write_into(dir.path()).unwrap();
        assert!(path.ends_with("filtered_stock_data.csv"));
        assert_eq!(std::fs::read(path).unwrap().len(), artifact.len());
    }
}
