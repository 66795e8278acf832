//! Panel 4: the filtered rows, when the full dataset is requested.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Cell, Paragraph, Row, Table};
use ratatui::Frame;

use kabuscope_core::render::TableView;
use kabuscope_core::schema::PRICE_CHANGE;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(view) = app.view() else {
        render_hint(f, area, "Load data from the Source panel (press 1) first.");
        return;
    };
    match &view.table {
        Some(table) => render_table(f, area, table, app.table_scroll),
        None => render_hint(
            f,
            area,
            "Turn on 'Show full dataset' (press t) to list the filtered rows.",
        ),
    }
}

fn render_hint(f: &mut Frame, area: Rect, message: &str) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), theme::muted())),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

fn render_table(f: &mut Frame, area: Rect, table: &TableView, scroll: usize) {
    let change_col = table.headers.iter().position(|h| h == PRICE_CHANGE);
    let visible = (area.height as usize).saturating_sub(2);

    let header = Row::new(
        table
            .headers
            .iter()
            .map(|h| Cell::from(h.as_str()).style(theme::accent_bold())),
    );

    let rows = table.rows.iter().skip(scroll).take(visible).map(|row| {
        Row::new(row.iter().enumerate().map(|(c, cell)| {
            let style = match (Some(c) == change_col, cell.parse::<f64>()) {
                (true, Ok(value)) => Style::default().fg(theme::change_color(value)),
                _ => theme::text(),
            };
            Cell::from(cell.as_str()).style(style)
        }))
    });

    let widths: Vec<Constraint> = table
        .column_widths()
        .into_iter()
        .map(|w| Constraint::Length(w as u16))
        .collect();

    let footer = format!(
        "rows {}-{} of {}",
        (scroll + 1).min(table.rows.len()),
        (scroll + visible).min(table.rows.len()),
        table.total_rows
    );

    let widget = Table::new(rows, widths)
        .header(header)
        .column_spacing(2)
        .footer(Row::new(vec![Cell::from(footer).style(theme::muted())]));
    f.render_widget(widget, area);
}
