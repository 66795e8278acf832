//! Top-level UI layout: five panels with a status bar.

pub mod chart_panel;
pub mod filter_panel;
pub mod help_panel;
pub mod overlays;
pub mod source_panel;
pub mod status_bar;
pub mod table_panel;
pub mod widgets;

use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;

use crate::app::{AppState, Overlay, Panel};
use crate::theme;

/// Draw the entire UI.
pub fn draw(f: &mut Frame, app: &AppState) {
    let [main_area, status_area] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(f.area());

    draw_panel(f, main_area, app);
    status_bar::render(f, status_area, app);

    match &app.overlay {
        Overlay::Welcome => overlays::render_welcome(f, main_area),
        Overlay::ErrorHistory => overlays::render_error_history(f, main_area, app),
        Overlay::UploadPath => overlays::render_upload_path(f, main_area, &app.path_input),
        Overlay::None => {}
    }
}

/// Draw a single panel with its border.
fn draw_panel(f: &mut Frame, area: Rect, app: &AppState) {
    let panel = app.active_panel;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(true))
        .title(format!(" {} [{}] ", panel.label(), panel.index() + 1))
        .title_style(theme::panel_title(true));

    let inner = block.inner(area);
    f.render_widget(block, area);

    // The slider track is only hit-testable while the chart is on screen.
    if panel != Panel::Chart {
        app.slider_track.set(None);
    }

    match panel {
        Panel::Source => source_panel::render(f, inner, app),
        Panel::Filter => filter_panel::render(f, inner, app),
        Panel::Chart => chart_panel::render(f, inner, app),
        Panel::Table => table_panel::render(f, inner, app),
        Panel::Help => help_panel::render(f, inner, app),
    }
}

/// A `percent_x` by `percent_y` rect centered in `area`, for overlays.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let [row] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    let [popup] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(row);
    popup
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_is_centered() {
        let popup = centered_rect(50, 50, Rect::new(0, 0, 100, 40));
        assert_eq!(popup, Rect::new(25, 10, 50, 20));
    }
}
