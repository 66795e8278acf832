//! Application state: single owner, main thread only.
//!
//! Every interaction edits the selection and marks the view stale; the main
//! loop then runs the session once and stores the outcome here.

use std::cell::Cell;
use std::collections::VecDeque;
use std::path::PathBuf;

use chrono::{Duration, NaiveDateTime};
use ratatui::layout::Rect;
use tracing::{debug, info};

use kabuscope_core::data::{DataError, DownloadProgress};
use kabuscope_core::render::{render_png, Handle, PngOptions, RangeSlider};
use kabuscope_core::{
    ChartMode, DateRange, PipelineError, Selection, Session, SourceChoice, View, ViewOutcome,
    ViewRequest,
};

pub const CHART_FILE_NAME: &str = "chart.png";

const ERROR_HISTORY_CAP: usize = 50;

/// Which panel is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Source,
    Filter,
    Chart,
    Table,
    Help,
}

impl Panel {
    pub const COUNT: usize = 5;

    pub fn index(self) -> usize {
        match self {
            Panel::Source => 0,
            Panel::Filter => 1,
            Panel::Chart => 2,
            Panel::Table => 3,
            Panel::Help => 4,
        }
    }

    pub fn from_index(i: usize) -> Option<Self> {
        match i {
            0 => Some(Panel::Source),
            1 => Some(Panel::Filter),
            2 => Some(Panel::Chart),
            3 => Some(Panel::Table),
            4 => Some(Panel::Help),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Panel::Source => "Source",
            Panel::Filter => "Filter",
            Panel::Chart => "Chart",
            Panel::Table => "Table",
            Panel::Help => "Help",
        }
    }

    pub fn next(self) -> Panel {
        Panel::from_index((self.index() + 1) % Self::COUNT).unwrap_or(Panel::Source)
    }

    pub fn prev(self) -> Panel {
        Panel::from_index((self.index() + Self::COUNT - 1) % Self::COUNT).unwrap_or(Panel::Source)
    }
}

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// An entry in the error history overlay.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub timestamp: NaiveDateTime,
    pub category: ErrorCategory,
    pub message: String,
    pub context: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Export,
    Other,
}

impl ErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Network => "NET",
            ErrorCategory::Data => "DATA",
            ErrorCategory::Export => "SAVE",
            ErrorCategory::Other => "ERR",
        }
    }

    fn of(err: &PipelineError) -> Self {
        match err {
            PipelineError::AllSymbolsFailed { .. } => ErrorCategory::Network,
            PipelineError::Data(DataError::Io { .. } | DataError::Parse(_)) => ErrorCategory::Data,
            PipelineError::Data(_) => ErrorCategory::Network,
            PipelineError::Dataset(_) => ErrorCategory::Data,
            PipelineError::Export(_) => ErrorCategory::Export,
            PipelineError::Render(_) => ErrorCategory::Other,
        }
    }
}

/// Rows of the Filter panel, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Symbol,
    Start,
    End,
    Mode,
    Table,
    Download,
}

impl FilterField {
    pub const ALL: [FilterField; 6] = [
        FilterField::Symbol,
        FilterField::Start,
        FilterField::End,
        FilterField::Mode,
        FilterField::Table,
        FilterField::Download,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FilterField::Symbol => "Select a company",
            FilterField::Start => "Start date",
            FilterField::End => "End date",
            FilterField::Mode => "Chart type",
            FilterField::Table => "Show full dataset",
            FilterField::Download => "Download filtered data",
        }
    }

    fn position(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> FilterField {
        Self::ALL[(self.position() + 1).min(Self::ALL.len() - 1)]
    }

    pub fn prev(self) -> FilterField {
        Self::ALL[self.position().saturating_sub(1)]
    }
}

/// Which overlay (if any) is shown on top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    None,
    Welcome,
    ErrorHistory,
    UploadPath,
}

/// Tallies a fetch batch so the status bar can summarize it afterwards.
#[derive(Debug, Default)]
pub struct StatusProgress {
    succeeded: Cell<usize>,
    failed: Cell<usize>,
    total: Cell<usize>,
}

impl StatusProgress {
    pub fn summary(&self) -> String {
        format!(
            "Fetch complete: {}/{} companies loaded, {} failed",
            self.succeeded.get(),
            self.total.get(),
            self.failed.get()
        )
    }
}

impl DownloadProgress for StatusProgress {
    fn on_start(&self, name: &str, index: usize, total: usize) {
        self.total.set(total);
        debug!(name, index, total, "fetching");
    }

    fn on_complete(&self, _name: &str, _index: usize, _total: usize, result: &Result<(), DataError>) {
        match result {
            Ok(()) => self.succeeded.set(self.succeeded.get() + 1),
            Err(_) => self.failed.set(self.failed.get() + 1),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        self.succeeded.set(succeeded);
        self.failed.set(failed);
        self.total.set(total);
    }
}

/// Top-level application state.
pub struct AppState {
    // Navigation
    pub active_panel: Panel,
    pub running: bool,

    // Pipeline
    pub session: Session,
    pub source: SourceChoice,
    pub selection: Selection,
    pub outcome: Option<ViewOutcome>,
    pub needs_refresh: bool,

    // Panel states
    pub source_cursor: usize,
    pub filter_field: FilterField,
    pub slider: RangeSlider,
    pub drag: Option<Handle>,
    /// Screen row of the slider track from the last draw, for mouse hits.
    pub slider_track: Cell<Option<Rect>>,
    pub table_scroll: usize,

    // Cross-cutting
    pub status_message: Option<(String, StatusLevel)>,
    pub error_history: VecDeque<ErrorRecord>,
    pub error_scroll: usize,
    pub overlay: Overlay,
    pub path_input: String,

    pub export_dir: PathBuf,
}

impl AppState {
    pub fn new(session: Session, export_dir: PathBuf) -> Self {
        Self {
            active_panel: Panel::Source,
            running: true,
            session,
            source: SourceChoice::Remote,
            selection: Selection::default(),
            outcome: None,
            needs_refresh: true,
            source_cursor: 0,
            filter_field: FilterField::Symbol,
            slider: RangeSlider::new(0),
            drag: None,
            slider_track: Cell::new(None),
            table_scroll: 0,
            status_message: None,
            error_history: VecDeque::with_capacity(ERROR_HISTORY_CAP),
            error_scroll: 0,
            overlay: Overlay::Welcome,
            path_input: String::new(),
            export_dir,
        }
    }

    pub fn view(&self) -> Option<&View> {
        self.outcome.as_ref().and_then(ViewOutcome::view)
    }

    pub fn request(&self) -> ViewRequest {
        ViewRequest::new(self.source.clone(), self.selection.clone())
    }

    /// Whether the next refresh goes to the network.
    pub fn will_fetch(&self) -> bool {
        self.source == SourceChoice::Remote
            && !self.session.fetch_cache().contains(&self.session.universe().fetch_key())
    }

    /// Run the pipeline for the current request and store the outcome.
    pub fn refresh(&mut self) {
        self.needs_refresh = false;
        let fetching = self.will_fetch();
        let progress = StatusProgress::default();
        let request = self.request();

        match self.session.run(&request, &progress) {
            Ok(ViewOutcome::AwaitingUpload { prompt }) => {
                self.set_warning(prompt.clone());
                self.slider = RangeSlider::new(0);
                self.outcome = Some(ViewOutcome::AwaitingUpload { prompt });
            }
            Ok(ViewOutcome::Ready(view)) => {
                self.selection.chosen_symbol = view.chosen_symbol.clone();
                self.selection.date_range = view.range;
                self.slider.resize_series(view.chart.len());
                self.table_scroll = self
                    .table_scroll
                    .min(view.filtered.height().saturating_sub(1));

                if fetching {
                    for warning in &view.warnings {
                        self.record(ErrorCategory::Network, warning.clone(), "fetch".into());
                    }
                }
                if fetching && !view.warnings.is_empty() {
                    self.set_warning(format!("{} (e: details)", progress.summary()));
                } else if fetching {
                    self.set_status(progress.summary());
                } else if let Some(notice) = &view.notice {
                    self.set_status(notice.clone());
                } else {
                    self.set_status(format!(
                        "{} rows in view from {}",
                        view.filtered.height(),
                        view.source_label
                    ));
                }
                self.outcome = Some(ViewOutcome::Ready(view));
            }
            Err(err) => {
                for warning in err.warnings() {
                    self.record(ErrorCategory::Network, warning, "fetch".into());
                }
                let category = ErrorCategory::of(&err);
                self.push_error(category, err.to_string(), self.source.label().into());
                self.slider = RangeSlider::new(0);
                self.outcome = None;
            }
        }
    }

    /// Switch to the source under the Source panel cursor.
    pub fn choose_source(&mut self, index: usize) {
        self.source_cursor = index.min(1);
        match self.source_cursor {
            0 => {
                if self.source != SourceChoice::Remote {
                    self.source = SourceChoice::Remote;
                    self.selection = Selection::default();
                    self.needs_refresh = true;
                }
            }
            _ => {
                if !matches!(self.source, SourceChoice::Upload(Some(_))) {
                    self.source = SourceChoice::Upload(None);
                    self.selection = Selection::default();
                    self.needs_refresh = true;
                }
                self.overlay = Overlay::UploadPath;
            }
        }
    }

    /// Use the typed path as the uploaded CSV.
    pub fn submit_upload(&mut self) {
        let path = self.path_input.trim().to_string();
        self.overlay = Overlay::None;
        if path.is_empty() {
            return;
        }
        info!(path = %path, "upload chosen");
        self.source_cursor = 1;
        self.source = SourceChoice::Upload(Some(PathBuf::from(path)));
        self.selection = Selection::default();
        self.needs_refresh = true;
    }

    /// Drop the cached remote assembly and fetch again.
    pub fn reload(&mut self) {
        if self.session.invalidate_remote() {
            self.set_status("Remote data cleared");
        }
        if self.source == SourceChoice::Remote {
            self.needs_refresh = true;
        }
    }

    /// Step through the symbols of the loaded dataset, wrapping around.
    pub fn cycle_symbol(&mut self, delta: isize) {
        let Some(view) = self.view() else { return };
        if view.symbols.is_empty() {
            return;
        }
        let count = view.symbols.len() as isize;
        let current = view
            .chosen_symbol
            .as_ref()
            .and_then(|s| view.symbols.iter().position(|x| x == s))
            .unwrap_or(0) as isize;
        let symbol = view.symbols[(current + delta).rem_euclid(count) as usize].clone();

        self.selection.chosen_symbol = Some(symbol);
        self.selection.date_range = None;
        self.needs_refresh = true;
    }

    /// Move one end of the date range by `days`, within the observed bounds
    /// and without crossing the other end.
    pub fn shift_date(&mut self, handle: Handle, days: i64) {
        let Some(view) = self.view() else { return };
        let Some(bounds) = view.bounds else { return };
        let Some(range) = self.selection.date_range.or(view.range) else { return };

        let moved = |date: chrono::NaiveDate| {
            date.checked_add_signed(Duration::days(days)).unwrap_or(date)
        };
        let next = match handle {
            Handle::Start => {
                DateRange::new(moved(range.start).clamp(bounds.start, range.end), range.end)
            }
            Handle::End => {
                DateRange::new(range.start, moved(range.end).clamp(range.start, bounds.end))
            }
        };
        if next != range {
            self.selection.date_range = Some(next);
            self.needs_refresh = true;
        }
    }

    /// Back to the full observed range.
    pub fn reset_dates(&mut self) {
        if self.selection.date_range.is_some() {
            self.selection.date_range = None;
            self.needs_refresh = true;
        }
    }

    pub fn toggle_chart_mode(&mut self) {
        self.selection.chart_mode = self.selection.chart_mode.toggle();
        self.slider.reset();
        self.needs_refresh = true;
    }

    pub fn toggle_table(&mut self) {
        self.selection.show_table = !self.selection.show_table;
        self.needs_refresh = true;
    }

    /// Write the filtered CSV into the export directory.
    pub fn export_csv(&mut self) {
        let Some(view) = self.view() else {
            self.set_warning("Nothing to download yet");
            return;
        };
        match view.export.write_into(&self.export_dir) {
            Ok(path) => self.set_status(format!("Saved {}", path.display())),
            Err(e) => self.push_error(ErrorCategory::Export, e.to_string(), "download".into()),
        }
    }

    /// Save the chart as a PNG; in interactive mode only the slider window is drawn.
    pub fn save_chart_png(&mut self) {
        let Some(view) = self.view() else {
            self.set_warning("Nothing to draw yet");
            return;
        };
        let mut spec = view.chart.clone();
        if spec.mode == ChartMode::Interactive && !self.slider.is_full() {
            spec.points = spec
                .points
                .get(self.slider.window())
                .map(<[_]>::to_vec)
                .unwrap_or_default();
        }
        let path = self.export_dir.join(CHART_FILE_NAME);
        match render_png(&spec, &path, PngOptions::default()) {
            Ok(()) => self.set_status(format!("Chart saved to {}", path.display())),
            Err(e) => self.push_error(ErrorCategory::Other, e.to_string(), "chart".into()),
        }
    }

    /// Add to the history without touching the status line.
    fn record(&mut self, category: ErrorCategory, message: String, context: String) {
        let record = ErrorRecord {
            timestamp: chrono::Local::now().naive_local(),
            category,
            message,
            context,
        };
        self.error_history.push_front(record);
        if self.error_history.len() > ERROR_HISTORY_CAP {
            self.error_history.pop_back();
        }
    }

    /// Push an error to the history, capping at 50, and show it.
    pub fn push_error(&mut self, category: ErrorCategory, message: String, context: String) {
        self.record(category, message.clone(), context);
        self.status_message = Some((message, StatusLevel::Error));
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }
}
