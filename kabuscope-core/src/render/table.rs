//! Plain-text tabular view of a dataset.

use polars::prelude::*;

use super::RenderError;
use crate::data::Dataset;

/// Headers and stringified cells, in dataset order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableView {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Rows in the dataset, which may exceed `rows.len()` when limited.
    pub total_rows: usize,
}

impl TableView {
    /// Stringify every cell of `dataset`. Nulls become empty strings.
    pub fn from_dataset(dataset: &Dataset, limit: Option<usize>) -> Result<Self, RenderError> {
        let frame = dataset.frame();
        let total_rows = frame.height();
        let shown = limit.map_or(total_rows, |n| n.min(total_rows));

        let mut headers = Vec::with_capacity(frame.width());
        let mut columns = Vec::with_capacity(frame.width());
        for column in frame.get_columns() {
            let name = column.name().to_string();
            let text = column
                .cast(&DataType::String)
                .map_err(|e| RenderError::Column {
                    column: name.clone(),
                    reason: e.to_string(),
                })?;
            headers.push(name);
            columns.push(text);
        }

        let mut rows = Vec::with_capacity(shown);
        for i in 0..shown {
            let mut row = Vec::with_capacity(columns.len());
            for (column, name) in columns.iter().zip(&headers) {
                let values = column.str().map_err(|e| RenderError::Column {
                    column: name.clone(),
                    reason: e.to_string(),
                })?;
                row.push(values.get(i).unwrap_or_default().to_string());
            }
            rows.push(row);
        }

        Ok(Self {
            headers,
            rows,
            total_rows,
        })
    }

    pub fn is_truncated(&self) -> bool {
        self.rows.len() < self.total_rows
    }

    /// Display width of each column: the widest of header and cells.
    pub fn column_widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(c, header)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(c))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Space-aligned text with a header line and a rule.
    pub fn to_text(&self) -> String {
        let widths = self.column_widths();
        let line = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, &w)| format!("{cell:<w$}"))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut out = String::new();
        out.push_str(&line(&self.headers));
        out.push('\n');
        let rule: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        out.push_str(&"-".repeat(rule));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&line(row));
            out.push('\n');
        }
        if self.is_truncated() {
            out.push_str(&format!(
                "... {} of {} rows shown\n",
                self.rows.len(),
                self.total_rows
            ));
        }
        out
    }
}
