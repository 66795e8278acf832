//! Rendering: chart model, range slider, static PNG, and the tabular view.
//!
//! Nothing here caches; every view is rebuilt from the filtered dataset.

pub mod chart;
pub mod slider;
pub mod static_png;
pub mod table;

pub use chart::{ChartPoint, ChartSpec};
pub use slider::{Handle, RangeSlider};
pub use static_png::{render_png, PngOptions};
pub use table::TableView;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to draw chart: {0}")]
    Draw(String),

    #[error("failed to read column '{column}': {reason}")]
    Column { column: String, reason: String },
}
