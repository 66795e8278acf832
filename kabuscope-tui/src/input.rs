//! Input dispatch: overlays, then global keys, then panel-specific handlers.
//! Mouse events only drive the range slider.

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use kabuscope_core::render::Handle;
use kabuscope_core::ChartMode;

use crate::app::{AppState, FilterField, Overlay, Panel};
use crate::ui::widgets::slider::{hit, track_fraction};

const PAN_STEP: isize = 1;
const PAN_STEP_FAST: isize = 20;
const MONTH_DAYS: i64 = 30;

pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    // 1. Overlays consume input first.
    match &app.overlay {
        Overlay::Welcome => {
            app.overlay = Overlay::None;
            return;
        }
        Overlay::ErrorHistory => {
            handle_error_overlay(app, key);
            return;
        }
        Overlay::UploadPath => {
            handle_upload_overlay(app, key);
            return;
        }
        Overlay::None => {}
    }

    // 2. Global keys.
    match key.code {
        KeyCode::Char('q') => {
            app.running = false;
            return;
        }
        KeyCode::Char(c @ '1'..='5') => {
            if let Some(panel) = Panel::from_index(c as usize - '1' as usize) {
                app.active_panel = panel;
            }
            return;
        }
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.active_panel = app.active_panel.prev();
            } else {
                app.active_panel = app.active_panel.next();
            }
            return;
        }
        KeyCode::BackTab => {
            app.active_panel = app.active_panel.prev();
            return;
        }
        KeyCode::Char('e') => {
            app.error_scroll = 0;
            app.overlay = Overlay::ErrorHistory;
            return;
        }
        KeyCode::Char('u') => {
            app.choose_source(1);
            return;
        }
        KeyCode::Char('r') => {
            app.reload();
            return;
        }
        KeyCode::Char('x') => {
            app.export_csv();
            return;
        }
        KeyCode::Char('p') => {
            app.save_chart_png();
            return;
        }
        KeyCode::Char('m') => {
            app.toggle_chart_mode();
            return;
        }
        KeyCode::Char('t') => {
            app.toggle_table();
            return;
        }
        _ => {}
    }

    // 3. Panel-specific keys.
    match app.active_panel {
        Panel::Source => handle_source_key(app, key),
        Panel::Filter => handle_filter_key(app, key),
        Panel::Chart => handle_chart_key(app, key),
        Panel::Table => handle_table_key(app, key),
        Panel::Help => {}
    }
}

fn handle_error_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('e') => {
            app.overlay = Overlay::None;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.error_scroll + 1 < app.error_history.len() {
                app.error_scroll += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.error_scroll = app.error_scroll.saturating_sub(1);
        }
        _ => {}
    }
}

fn handle_upload_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.overlay = Overlay::None;
        }
        KeyCode::Enter => app.submit_upload(),
        KeyCode::Backspace => {
            app.path_input.pop();
        }
        KeyCode::Char(c) => app.path_input.push(c),
        _ => {}
    }
}

fn handle_source_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.source_cursor = (app.source_cursor + 1).min(1),
        KeyCode::Char('k') | KeyCode::Up => app.source_cursor = app.source_cursor.saturating_sub(1),
        KeyCode::Enter | KeyCode::Char(' ') => app.choose_source(app.source_cursor),
        _ => {}
    }
}

fn handle_filter_key(app: &mut AppState, key: KeyEvent) {
    let step = match key.code {
        KeyCode::Char('h') | KeyCode::Left => -1,
        KeyCode::Char('l') | KeyCode::Right => 1,
        KeyCode::Char('H') => -MONTH_DAYS,
        KeyCode::Char('L') => MONTH_DAYS,
        _ => 0,
    };

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.filter_field = app.filter_field.next(),
        KeyCode::Char('k') | KeyCode::Up => app.filter_field = app.filter_field.prev(),
        KeyCode::Char('0') | KeyCode::Backspace => app.reset_dates(),
        KeyCode::Enter | KeyCode::Char(' ') => match app.filter_field {
            FilterField::Symbol => app.cycle_symbol(1),
            FilterField::Mode => app.toggle_chart_mode(),
            FilterField::Table => app.toggle_table(),
            FilterField::Download => app.export_csv(),
            FilterField::Start | FilterField::End => {}
        },
        _ if step != 0 => match app.filter_field {
            FilterField::Symbol => app.cycle_symbol(step.signum() as isize),
            FilterField::Start => app.shift_date(Handle::Start, step),
            FilterField::End => app.shift_date(Handle::End, step),
            FilterField::Mode => app.toggle_chart_mode(),
            FilterField::Table => app.toggle_table(),
            FilterField::Download => {}
        },
        _ => {}
    }
}

fn handle_chart_key(app: &mut AppState, key: KeyEvent) {
    if app.selection.chart_mode != ChartMode::Interactive {
        return;
    }
    let slider = &mut app.slider;
    match key.code {
        KeyCode::Char('h') | KeyCode::Left => slider.pan(-PAN_STEP),
        KeyCode::Char('l') | KeyCode::Right => slider.pan(PAN_STEP),
        KeyCode::Char('H') => slider.pan(-PAN_STEP_FAST),
        KeyCode::Char('L') => slider.pan(PAN_STEP_FAST),
        KeyCode::Char('+') | KeyCode::Char('=') => slider.zoom(-PAN_STEP),
        KeyCode::Char('-') => slider.zoom(PAN_STEP),
        KeyCode::Char('[') => slider.nudge(Handle::Start, -PAN_STEP),
        KeyCode::Char(']') => slider.nudge(Handle::Start, PAN_STEP),
        KeyCode::Char('{') => slider.nudge(Handle::End, -PAN_STEP),
        KeyCode::Char('}') => slider.nudge(Handle::End, PAN_STEP),
        KeyCode::Char('0') => slider.reset(),
        _ => {}
    }
}

fn handle_table_key(app: &mut AppState, key: KeyEvent) {
    let rows = app
        .view()
        .and_then(|v| v.table.as_ref())
        .map_or(0, |t| t.rows.len());
    let last = rows.saturating_sub(1);
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.table_scroll = (app.table_scroll + 1).min(last),
        KeyCode::Char('k') | KeyCode::Up => app.table_scroll = app.table_scroll.saturating_sub(1),
        KeyCode::PageDown => app.table_scroll = (app.table_scroll + 20).min(last),
        KeyCode::PageUp => app.table_scroll = app.table_scroll.saturating_sub(20),
        KeyCode::Char('g') | KeyCode::Home => app.table_scroll = 0,
        KeyCode::Char('G') | KeyCode::End => app.table_scroll = last,
        _ => {}
    }
}

/// Press picks the nearest handle, drag moves it, release lets go.
pub fn handle_mouse(app: &mut AppState, mouse: MouseEvent) {
    if app.overlay != Overlay::None || app.active_panel != Panel::Chart {
        return;
    }
    let Some(track) = app.slider_track.get() else {
        return;
    };
    let fraction = track_fraction(track, mouse.column);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) if hit(track, mouse.column, mouse.row) => {
            let handle = app.slider.nearest_handle(fraction);
            app.slider.drag(handle, fraction);
            app.drag = Some(handle);
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            if let Some(handle) = app.drag {
                app.slider.drag(handle, fraction);
            }
        }
        MouseEventKind::Up(MouseButton::Left) => app.drag = None,
        MouseEventKind::ScrollUp => app.slider.zoom(-PAN_STEP),
        MouseEventKind::ScrollDown => app.slider.zoom(PAN_STEP),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use chrono::NaiveDate;
    use crossterm::event::KeyEventState;
    use ratatui::layout::Rect;

    use kabuscope_core::data::{Company, SyntheticProvider, UniverseConfig};
    use kabuscope_core::Session;

    fn app() -> AppState {
        let universe = UniverseConfig {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            companies: vec![
                Company::new("SONY", "6758.T"),
                Company::new("HONDA", "7267.T"),
            ],
        };
        let session = Session::new(Box::new(SyntheticProvider::new()), universe);
        let mut app = AppState::new(session, PathBuf::from("."));
        app.overlay = Overlay::None;
        app.refresh();
        app
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn q_quits_and_digits_switch_panels() {
        let mut app = app();
        handle_key(&mut app, press(KeyCode::Char('3')));
        assert_eq!(app.active_panel, Panel::Chart);
        handle_key(&mut app, press(KeyCode::Tab));
        assert_eq!(app.active_panel, Panel::Table);
        handle_key(&mut app, press(KeyCode::BackTab));
        assert_eq!(app.active_panel, Panel::Chart);
        handle_key(&mut app, press(KeyCode::Char('q')));
        assert!(!app.running);
    }

    #[test]
    fn release_events_are_ignored() {
        let mut app = app();
        let mut key = press(KeyCode::Char('q'));
        key.kind = KeyEventKind::Release;
        handle_key(&mut app, key);
        assert!(app.running);
    }

    #[test]
    fn welcome_is_dismissed_by_any_key() {
        let mut app = app();
        app.overlay = Overlay::Welcome;
        handle_key(&mut app, press(KeyCode::Char('q')));
        assert_eq!(app.overlay, Overlay::None);
        assert!(app.running);
    }

    #[test]
    fn upload_overlay_collects_the_path() {
        let mut app = app();
        handle_key(&mut app, press(KeyCode::Char('u')));
        assert_eq!(app.overlay, Overlay::UploadPath);
        for c in "a.csvx".chars() {
            handle_key(&mut app, press(KeyCode::Char(c)));
        }
        handle_key(&mut app, press(KeyCode::Backspace));
        assert_eq!(app.path_input, "a.csv");

        handle_key(&mut app, press(KeyCode::Enter));
        assert_eq!(app.overlay, Overlay::None);
        assert_eq!(
            app.source,
            kabuscope_core::SourceChoice::Upload(Some(PathBuf::from("a.csv")))
        );
        assert!(app.needs_refresh);
    }

    #[test]
    fn filter_keys_edit_the_selection() {
        let mut app = app();
        handle_key(&mut app, press(KeyCode::Char('2')));
        handle_key(&mut app, press(KeyCode::Char('l')));
        assert_eq!(app.selection.chosen_symbol.as_deref(), Some("HONDA"));
        app.refresh();

        handle_key(&mut app, press(KeyCode::Char('j')));
        assert_eq!(app.filter_field, FilterField::Start);
        let before = app.selection.date_range.unwrap();
        handle_key(&mut app, press(KeyCode::Char('l')));
        assert_eq!(
            app.selection.date_range.unwrap().start,
            before.start.succ_opt().unwrap()
        );

        handle_key(&mut app, press(KeyCode::Char('m')));
        assert_eq!(app.selection.chart_mode, ChartMode::Interactive);
        handle_key(&mut app, press(KeyCode::Char('t')));
        assert!(app.selection.show_table);
    }

    #[test]
    fn chart_keys_only_move_the_slider_in_interactive_mode() {
        let mut app = app();
        app.active_panel = Panel::Chart;
        let len = app.slider.len();
        handle_key(&mut app, press(KeyCode::Char('+')));
        assert!(app.slider.is_full());

        app.toggle_chart_mode();
        app.refresh();
        handle_key(&mut app, press(KeyCode::Char('+')));
        assert_eq!(app.slider.start(), 1);
        assert_eq!(app.slider.end(), len - 2);
        handle_key(&mut app, press(KeyCode::Char('0')));
        assert!(app.slider.is_full());
    }

    #[test]
    fn mouse_drag_moves_the_nearest_handle() {
        let mut app = app();
        app.toggle_chart_mode();
        app.refresh();
        app.active_panel = Panel::Chart;
        let len = app.slider.len();
        let track = Rect::new(0, 10, 101, 1);
        app.slider_track.set(Some(track));

        handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 90, 10));
        assert_eq!(app.drag, Some(Handle::End));
        handle_mouse(&mut app, mouse(MouseEventKind::Drag(MouseButton::Left), 50, 3));
        assert_eq!(app.slider.end(), app.slider.index_at(0.5));
        assert_eq!(app.slider.start(), 0);
        handle_mouse(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 50, 3));
        assert_eq!(app.drag, None);
        assert!(app.slider.end() < len - 1);
    }

    #[test]
    fn mouse_press_off_the_track_is_ignored() {
        let mut app = app();
        app.active_panel = Panel::Chart;
        app.slider_track.set(Some(Rect::new(0, 10, 101, 1)));
        handle_mouse(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 10, 4));
        assert_eq!(app.drag, None);
        assert!(app.slider.is_full());
    }
}
