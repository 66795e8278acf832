//! Panel 2: company, date range, chart type, table toggle and download.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use kabuscope_core::View;

use crate::app::{AppState, FilterField};
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(view) = app.view() else {
        let hint = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Load data from the Source panel (press 1) to filter it.",
                theme::muted(),
            )),
        ]);
        f.render_widget(hint, area);
        return;
    };

    let mut lines = vec![Line::from("")];
    for field in FilterField::ALL {
        let focused = field == app.filter_field;
        lines.push(Line::from(vec![
            Span::styled(if focused { "> " } else { "  " }, theme::accent()),
            Span::styled(format!("{:<24}", field.label()), theme::muted()),
            Span::styled(value_of(field, app, view), theme::selected(focused)),
        ]));
    }

    lines.push(Line::from(""));
    if let Some(bounds) = view.bounds {
        lines.push(Line::from(Span::styled(
            format!("Available dates: {bounds}"),
            theme::muted(),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "No typed Date column: the date filter is skipped.",
            theme::warning(),
        )));
    }
    lines.push(Line::from(Span::styled(
        format!("{} rows after filtering", view.filtered.height()),
        theme::muted(),
    )));

    f.render_widget(Paragraph::new(lines), area);
}

fn value_of(field: FilterField, app: &AppState, view: &View) -> String {
    match field {
        FilterField::Symbol => match &view.chosen_symbol {
            Some(symbol) => format!("< {symbol} >"),
            None => "(no Symbol column)".to_string(),
        },
        FilterField::Start => view
            .range
            .map_or_else(|| "-".to_string(), |r| r.start.to_string()),
        FilterField::End => view
            .range
            .map_or_else(|| "-".to_string(), |r| r.end.to_string()),
        FilterField::Mode => format!("< {} >", app.selection.chart_mode.label()),
        FilterField::Table => {
            if app.selection.show_table {
                "[x]".to_string()
            } else {
                "[ ]".to_string()
            }
        }
        FilterField::Download => format!(
            "{} ({} bytes, {})",
            view.export.file_name,
            view.export.len(),
            view.export.mime
        ),
    }
}
