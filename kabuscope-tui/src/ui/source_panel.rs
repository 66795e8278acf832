//! Panel 1: data source choice, what is loaded, and the configured companies.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use kabuscope_core::{SourceChoice, ViewOutcome};

use crate::app::AppState;
use crate::theme;

const OPTIONS: [SourceChoice; 2] = [SourceChoice::Remote, SourceChoice::Upload(None)];

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_choice(f, cols[0], app);
    render_universe(f, cols[1], app);
}

fn render_choice(f: &mut Frame, area: Rect, app: &AppState) {
    let mut lines = vec![
        Line::from(Span::styled("Choose data source:", theme::accent_bold())),
        Line::from(""),
    ];

    for (i, option) in OPTIONS.iter().enumerate() {
        let active = std::mem::discriminant(option) == std::mem::discriminant(&app.source);
        let marker = if active { "(•) " } else { "( ) " };
        lines.push(Line::from(vec![
            Span::styled(if i == app.source_cursor { "> " } else { "  " }, theme::accent()),
            Span::styled(
                format!("{marker}{}", option.label()),
                theme::selected(i == app.source_cursor),
            ),
        ]));
    }
    lines.push(Line::from(""));

    if let SourceChoice::Upload(Some(path)) = &app.source {
        lines.push(Line::from(vec![
            Span::styled("File: ", theme::muted()),
            Span::styled(path.display().to_string(), theme::text()),
        ]));
    }

    match &app.outcome {
        Some(ViewOutcome::AwaitingUpload { prompt }) => {
            lines.push(Line::from(Span::styled(prompt.as_str(), theme::warning())));
        }
        Some(ViewOutcome::Ready(view)) => {
            if let Some(notice) = &view.notice {
                lines.push(Line::from(Span::styled(notice.as_str(), theme::positive())));
            }
            lines.push(Line::from(vec![
                Span::styled("Loaded from: ", theme::muted()),
                Span::styled(view.source_label.as_str(), theme::text()),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Companies:   ", theme::muted()),
                Span::styled(
                    if view.symbols.is_empty() {
                        "(no Symbol column)".to_string()
                    } else {
                        view.symbols.join(", ")
                    },
                    theme::text(),
                ),
            ]));
            if let Some(bounds) = view.bounds {
                lines.push(Line::from(vec![
                    Span::styled("Dates:       ", theme::muted()),
                    Span::styled(bounds.to_string(), theme::text()),
                ]));
            }
            if !view.warnings.is_empty() {
                lines.push(Line::from(""));
                for warning in &view.warnings {
                    lines.push(Line::from(Span::styled(warning.as_str(), theme::warning())));
                }
            }
        }
        None => {
            lines.push(Line::from(Span::styled("Nothing loaded.", theme::muted())));
        }
    }

    f.render_widget(Paragraph::new(lines), area);
}

fn render_universe(f: &mut Frame, area: Rect, app: &AppState) {
    let universe = app.session.universe();
    let stats = app.session.fetch_cache().stats();

    let mut lines = vec![
        Line::from(Span::styled("Tokyo universe", theme::accent_bold())),
        Line::from(Span::styled(
            format!("{} .. {} (end exclusive)", universe.start, universe.end),
            theme::muted(),
        )),
        Line::from(""),
    ];
    for company in &universe.companies {
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<12}", company.name), theme::text()),
            Span::styled(company.ticker.as_str(), theme::secondary()),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("Fetch cache: {} hits, {} misses", stats.hits, stats.misses),
        theme::muted(),
    )));

    f.render_widget(Paragraph::new(lines), area);
}
