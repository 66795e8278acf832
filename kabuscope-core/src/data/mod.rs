//! Data sources: remote providers, CSV upload, dataset container, fetch cache.

pub mod cache;
pub mod dataset;
pub mod provider;
pub mod remote;
pub mod synthetic;
pub mod universe;
pub mod upload;
pub mod yahoo;

pub use cache::{CacheStats, FetchCache};
pub use dataset::{Dataset, DatasetError};
pub use provider::{
    DataError, DataProvider, DataSource, DownloadProgress, FetchResult, NoProgress, RawBar,
    StdoutProgress,
};
pub use remote::{
    fetch_universe, FetchKey, FetchOutcome, FetchSummary, PartialDataset, SymbolFailure,
};
pub use synthetic::SyntheticProvider;
pub use universe::{Company, ConfigError, UniverseConfig, UNIVERSE_FILE_NAME};
pub use upload::{read_csv_bytes, read_csv_file};
pub use yahoo::YahooProvider;
