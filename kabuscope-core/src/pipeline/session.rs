use std::path::PathBuf;

use tracing::{info, warn};

use super::{PipelineError, LOADING_MESSAGE, UPLOAD_LOADED, UPLOAD_PROMPT};
use crate::data::{
    fetch_universe, read_csv_file, DataProvider, Dataset, DownloadProgress, FetchCache,
    UniverseConfig,
};
use crate::domain::{DateRange, Selection};
use crate::export::{ExportArtifact, ExportCache};
use crate::filter;
use crate::render::{ChartSpec, TableView};
use crate::transform;

/// Where the dataset comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceChoice {
    /// Fetch the configured universe from the provider.
    Remote,
    /// A user-supplied CSV file; `None` until one is chosen.
    Upload(Option<PathBuf>),
}

impl SourceChoice {
    pub fn label(&self) -> &'static str {
        match self {
            SourceChoice::Remote => "Fetch Tokyo Stock Data",
            SourceChoice::Upload(_) => "Upload Custom CSV",
        }
    }
}

/// Everything the user has chosen at one interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRequest {
    pub source: SourceChoice,
    pub selection: Selection,
}

impl ViewRequest {
    pub fn new(source: SourceChoice, selection: Selection) -> Self {
        Self { source, selection }
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub enum ViewOutcome {
    /// Upload mode without a file: nothing past the source step runs.
    AwaitingUpload { prompt: String },
    Ready(Box<View>),
}

impl ViewOutcome {
    pub fn view(&self) -> Option<&View> {
        match self {
            ViewOutcome::Ready(view) => Some(&**view),
            ViewOutcome::AwaitingUpload { .. } => None,
        }
    }
}

/// The rendered view model for one interaction.
#[derive(Debug, Clone)]
pub struct View {
    pub source_label: String,
    /// Success message for the source step, e.g. after an upload.
    pub notice: Option<String>,
    /// One line per company that failed to load.
    pub warnings: Vec<String>,
    /// Values of `Symbol` in first-seen order; empty when there is no such column.
    pub symbols: Vec<String>,
    pub chosen_symbol: Option<String>,
    /// Observed date range after the symbol filter.
    pub bounds: Option<DateRange>,
    /// The applied range: the request clamped to `bounds`, or `bounds` itself.
    pub range: Option<DateRange>,
    pub filtered: Dataset,
    pub export: ExportArtifact,
    pub chart: ChartSpec,
    pub table: Option<TableView>,
}

struct Loaded {
    dataset: Dataset,
    label: String,
    notice: Option<String>,
    warnings: Vec<String>,
}

/// Owns the provider, the universe, and the caches for one user session.
pub struct Session {
    provider: Box<dyn DataProvider>,
    universe: UniverseConfig,
    fetch_cache: FetchCache,
    export_cache: ExportCache,
}

impl Session {
    pub fn new(provider: Box<dyn DataProvider>, universe: UniverseConfig) -> Self {
        Self::with_fetch_cache(provider, universe, FetchCache::new())
    }

    /// Use a caller-supplied fetch cache, e.g. one carried over from a previous session.
    pub fn with_fetch_cache(
        provider: Box<dyn DataProvider>,
        universe: UniverseConfig,
        fetch_cache: FetchCache,
    ) -> Self {
        Self {
            provider,
            universe,
            fetch_cache,
            export_cache: ExportCache::new(),
        }
    }

    pub fn universe(&self) -> &UniverseConfig {
        &self.universe
    }

    pub fn fetch_cache(&self) -> &FetchCache {
        &self.fetch_cache
    }

    pub fn export_cache(&self) -> &ExportCache {
        &self.export_cache
    }

    /// Hand the fetch cache back, ending the session.
    pub fn into_fetch_cache(self) -> FetchCache {
        self.fetch_cache
    }

    /// Forget the stored assembly for the current universe.
    pub fn invalidate_remote(&mut self) -> bool {
        let key = self.universe.fetch_key();
        let dropped = self.fetch_cache.invalidate(&key);
        if dropped {
            info!(key = %key.digest(), "remote data invalidated");
        }
        dropped
    }

    /// Run the whole pipeline for `request`.
    pub fn run(
        &mut self,
        request: &ViewRequest,
        progress: &dyn DownloadProgress,
    ) -> Result<ViewOutcome, PipelineError> {
        let Some(loaded) = self.load(&request.source, progress)? else {
            info!("waiting for upload");
            return Ok(ViewOutcome::AwaitingUpload {
                prompt: UPLOAD_PROMPT.to_string(),
            });
        };

        let enriched = transform::enrich(&loaded.dataset)?;
        let selection = &request.selection;

        let symbols = enriched.symbols()?;
        let chosen_symbol = choose_symbol(&symbols, selection.chosen_symbol.as_deref());
        let by_symbol = filter::select(&enriched, chosen_symbol.as_deref(), None)?;

        let bounds = by_symbol.date_bounds()?;
        let range = bounds.map(|b| match selection.date_range {
            Some(requested) => requested.clamp_to(b),
            None => b,
        });
        let filtered = filter::select(&by_symbol, None, range)?;

        let export = self.export_cache.artifact(&filtered)?;
        let chart = ChartSpec::from_dataset(&filtered, selection.chart_mode, chosen_symbol.as_deref())?;
        let table = if selection.show_table {
            Some(TableView::from_dataset(&filtered, None)?)
        } else {
            None
        };

        info!(
            source = %loaded.label,
            symbol = chosen_symbol.as_deref().unwrap_or("-"),
            rows = filtered.height(),
            mode = selection.chart_mode.label(),
            "view ready"
        );

        Ok(ViewOutcome::Ready(Box::new(View {
            source_label: loaded.label,
            notice: loaded.notice,
            warnings: loaded.warnings,
            symbols,
            chosen_symbol,
            bounds,
            range,
            filtered,
            export,
            chart,
            table,
        })))
    }

    fn load(
        &mut self,
        source: &SourceChoice,
        progress: &dyn DownloadProgress,
    ) -> Result<Option<Loaded>, PipelineError> {
        match source {
            SourceChoice::Remote => {
                let key = self.universe.fetch_key();
                let partial = match self.fetch_cache.get(&key) {
                    Some(found) => found,
                    None => {
                        info!("{LOADING_MESSAGE}");
                        let partial =
                            fetch_universe(self.provider.as_ref(), &self.universe, progress)?;
                        if partial.is_total_failure() {
                            warn!(failed = partial.failures.len(), "every company failed");
                            return Err(PipelineError::AllSymbolsFailed {
                                failures: partial.failures,
                            });
                        }
                        self.fetch_cache.insert(key, partial)
                    }
                };
                Ok(Some(Loaded {
                    dataset: partial.dataset.clone(),
                    label: self.provider.name().to_string(),
                    notice: None,
                    warnings: partial.warnings(),
                }))
            }
            SourceChoice::Upload(None) => Ok(None),
            SourceChoice::Upload(Some(path)) => {
                let dataset = read_csv_file(path)?;
                Ok(Some(Loaded {
                    dataset,
                    label: path.display().to_string(),
                    notice: Some(UPLOAD_LOADED.to_string()),
                    warnings: Vec::new(),
                }))
            }
        }
    }
}

/// The requested symbol when present in the data, else the first one.
fn choose_symbol(symbols: &[String], requested: Option<&str>) -> Option<String> {
    requested
        .and_then(|r| symbols.iter().find(|s| s.as_str() == r))
        .or_else(|| symbols.first())
        .cloned()
}
