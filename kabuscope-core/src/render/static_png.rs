//! Static close-price chart rendered to a PNG file with plotters.

use std::path::Path;

use plotters::prelude::*;
use plotters::style::FontTransform;
use tracing::info;

use super::chart::ChartSpec;
use super::RenderError;

/// Canvas size and label density.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngOptions {
    pub width: u32,
    pub height: u32,
    pub x_labels: usize,
}

impl Default for PngOptions {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 600,
            x_labels: 12,
        }
    }
}

/// Draw `spec` as a line chart into `path`.
///
/// X labels are dates rotated a quarter turn. An empty chart still gets its
/// caption and axes.
pub fn render_png(spec: &ChartSpec, path: &Path, options: PngOptions) -> Result<(), RenderError> {
    let data = spec.xy();
    let x_max = data.last().map(|&(x, _)| x).unwrap_or(0.0).max(1.0);
    let (y_min, y_max) = spec.y_bounds(0, spec.len());

    let root = BitMapBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| RenderError::Draw(format!("fill canvas: {e}")))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&spec.title, ("sans-serif", 28).into_font())
        .margin(15)
        .x_label_area_size(90)
        .y_label_area_size(70)
        .build_cartesian_2d(0.0..x_max, y_min..y_max)
        .map_err(|e| RenderError::Draw(format!("build chart: {e}")))?;

    let date_label = |x: &f64| {
        spec.date_at(*x)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    };

    chart
        .configure_mesh()
        .x_desc(spec.x_label)
        .y_desc(spec.y_label)
        .x_labels(options.x_labels)
        .x_label_formatter(&date_label)
        .x_label_style(
            ("sans-serif", 12)
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .draw()
        .map_err(|e| RenderError::Draw(format!("draw mesh: {e}")))?;

    if !data.is_empty() {
        chart
            .draw_series(LineSeries::new(data, &BLUE))
            .map_err(|e| RenderError::Draw(format!("draw series: {e}")))?;
    }

    root.present()
        .map_err(|e| RenderError::Draw(format!("write {}: {e}", path.display())))?;

    info!(path = %path.display(), points = spec.len(), "chart rendered");
    Ok(())
}
