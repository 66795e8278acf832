//! Panel 3: close-price line chart, with a range slider in interactive mode.

use std::ops::Range;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Chart, Dataset, GraphType, Paragraph};
use ratatui::Frame;

use kabuscope_core::render::ChartSpec;
use kabuscope_core::ChartMode;

use crate::app::AppState;
use crate::theme;
use crate::ui::widgets::slider::RangeSliderWidget;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(view) = app.view() else {
        app.slider_track.set(None);
        render_empty(f, area, "Load data from the Source panel (press 1) to see the chart.");
        return;
    };
    let spec = &view.chart;
    if spec.is_empty() {
        app.slider_track.set(None);
        render_empty(f, area, "No close prices to chart for this selection.");
        return;
    }

    match spec.mode {
        ChartMode::Static => {
            app.slider_track.set(None);
            render_chart(f, area, spec, 0..spec.len(), view.chosen_symbol.as_deref());
        }
        ChartMode::Interactive => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(5), Constraint::Length(2)])
                .split(area);

            let window = app.slider.window();
            render_chart(f, chunks[0], spec, window, view.chosen_symbol.as_deref());

            let label = |i: usize| {
                spec.points
                    .get(i)
                    .map(|p| p.date.format(DATE_FORMAT).to_string())
                    .unwrap_or_default()
            };
            let slider = RangeSliderWidget::new(&app.slider)
                .labels(label(app.slider.start()), label(app.slider.end()));
            f.render_widget(slider, chunks[1]);
            app.slider_track.set(Some(Rect {
                height: 1,
                ..chunks[1]
            }));
        }
    }
}

fn render_empty(f: &mut Frame, area: Rect, message: &str) {
    let lines = vec![
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), theme::muted())),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

fn render_chart(
    f: &mut Frame,
    area: Rect,
    spec: &ChartSpec,
    window: Range<usize>,
    symbol: Option<&str>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(area);

    let data = spec.xy_range(window.start, window.end);
    let (y_min, y_max) = spec.y_bounds(window.start, window.end);
    let x_min = data.first().map_or(0.0, |&(x, _)| x);
    let x_max = data.last().map_or(0.0, |&(x, _)| x).max(x_min + 1.0);

    let mut title = vec![Span::styled(spec.title.as_str(), theme::accent_bold())];
    if let (Some(first), Some(last)) = (data.first(), data.last()) {
        let change = last.1 - first.1;
        title.push(Span::styled(
            format!("  {change:+.1}"),
            Style::default().fg(theme::change_color(change)),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(title)), chunks[0]);

    let date_label = |x: f64| {
        spec.date_at(x)
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default()
    };
    let x_labels = vec![
        Span::styled(date_label(x_min), theme::muted()),
        Span::styled(date_label((x_min + x_max) / 2.0), theme::muted()),
        Span::styled(date_label(x_max), theme::muted()),
    ];
    let y_labels = vec![
        Span::styled(format!("{y_min:.1}"), theme::muted()),
        Span::styled(format!("{:.1}", (y_min + y_max) / 2.0), theme::muted()),
        Span::styled(format!("{y_max:.1}"), theme::muted()),
    ];

    let dataset = Dataset::default()
        .name(symbol.unwrap_or("Close").to_string())
        .marker(symbols::Marker::Braille)
        .style(Style::default().fg(theme::ACCENT))
        .graph_type(GraphType::Line)
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .x_axis(
            Axis::default()
                .title(Span::styled(spec.x_label, theme::muted()))
                .style(theme::muted())
                .bounds([x_min, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled(spec.y_label, theme::muted()))
                .style(theme::muted())
                .bounds([y_min, y_max])
                .labels(y_labels),
        );

    f.render_widget(chart, chunks[1]);
}
