//! Kabuscope Core: data sources, transform, filters, export and chart model.
//!
//! This crate holds everything the dashboard does that is not presentation:
//! - Domain types (price rows, selection state, date ranges)
//! - Data providers (Yahoo Finance, synthetic) and the CSV upload reader
//! - Remote multi-symbol assembly with per-symbol failure isolation
//! - An injected fetch cache keyed on (tickers, window)
//! - Transform (derived columns, date normalization) and the filter pipeline
//! - CSV export with an identity-keyed byte cache
//! - Chart model, range slider model, static PNG rendering and table view
//! - The session pipeline that turns a view request into a rendered view

pub mod data;
pub mod domain;
pub mod export;
pub mod filter;
pub mod pipeline;
pub mod render;
pub mod schema;
pub mod transform;

pub use data::{Dataset, DatasetError};
pub use domain::{ChartMode, DateRange, PriceRow, Selection};
pub use pipeline::{PipelineError, Session, SourceChoice, View, ViewOutcome, ViewRequest};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: the data handed between pipeline stages is Send + Sync,
    /// so a presentation layer may move views across threads if it ever needs to.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::PriceRow>();
        require_sync::<domain::PriceRow>();
        require_send::<domain::Selection>();
        require_sync::<domain::Selection>();
        require_send::<data::Dataset>();
        require_sync::<data::Dataset>();
        require_send::<data::remote::PartialDataset>();
        require_sync::<data::remote::PartialDataset>();
        require_send::<export::ExportArtifact>();
        require_sync::<export::ExportArtifact>();
        require_send::<render::ChartSpec>();
        require_sync::<render::ChartSpec>();
    }
}
