//! Session pipeline: one call per interaction, from a view request to a
//! rendered view model.
//!
//! ```text
//! source ─▶ enrich ─▶ symbol filter ─▶ date filter ─┬▶ export
//!                                                    └▶ chart / table
//! ```

pub mod session;

pub use session::{Session, SourceChoice, View, ViewOutcome, ViewRequest};

use thiserror::Error;

use crate::data::{DataError, DatasetError, SymbolFailure};
use crate::export::ExportError;
use crate::render::RenderError;

pub const LOADING_MESSAGE: &str = "Loading Tokyo stock data...";
pub const UPLOAD_PROMPT: &str = "Please upload a CSV file to continue.";
pub const UPLOAD_LOADED: &str = "Custom dataset loaded!";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no company could be loaded ({} failed)", failures.len())]
    AllSymbolsFailed { failures: Vec<SymbolFailure> },

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl PipelineError {
    /// Per-company warnings carried by the error, if any.
    pub fn warnings(&self) -> Vec<String> {
        match self {
            PipelineError::AllSymbolsFailed { failures } => {
                failures.iter().map(SymbolFailure::message).collect()
            }
            _ => Vec::new(),
        }
    }
}
