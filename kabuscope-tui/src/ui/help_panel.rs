//! Panel 5: keyboard and mouse reference.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::AppState;
use crate::theme;

pub fn render(f: &mut Frame, area: Rect, _app: &AppState) {
    let mut lines: Vec<Line> = Vec::new();

    section(&mut lines, "Global");
    key(&mut lines, "1-5", "Switch to panel by number");
    key(&mut lines, "Tab / Shift+Tab", "Cycle panels forward / back");
    key(&mut lines, "x", "Download filtered data as CSV");
    key(&mut lines, "p", "Save the chart as PNG");
    key(&mut lines, "m", "Toggle Static / Interactive chart");
    key(&mut lines, "t", "Toggle full dataset table");
    key(&mut lines, "u", "Upload a custom CSV");
    key(&mut lines, "r", "Refetch remote data");
    key(&mut lines, "e", "Open error history");
    key(&mut lines, "q", "Quit");
    lines.push(Line::from(""));

    section(&mut lines, "Panel 1: Source");
    key(&mut lines, "j / k", "Move between data sources");
    key(&mut lines, "Enter", "Use the source under the cursor");
    lines.push(Line::from(""));

    section(&mut lines, "Panel 2: Filter");
    key(&mut lines, "j / k", "Move between fields");
    key(&mut lines, "h / l", "Previous / next company, or one day earlier / later");
    key(&mut lines, "H / L", "Dates by thirty days");
    key(&mut lines, "Enter", "Toggle, or download on the last row");
    key(&mut lines, "0", "Reset to the full date range");
    lines.push(Line::from(""));

    section(&mut lines, "Panel 3: Chart (Interactive)");
    key(&mut lines, "h / l", "Pan the slider window");
    key(&mut lines, "+ / -", "Narrow / widen the window");
    key(&mut lines, "[ / ]", "Move the left handle");
    key(&mut lines, "{ / }", "Move the right handle");
    key(&mut lines, "0", "Show the whole series");
    key(&mut lines, "mouse", "Drag a handle along the slider track");
    lines.push(Line::from(""));

    section(&mut lines, "Panel 4: Table");
    key(&mut lines, "j / k", "Scroll rows");
    key(&mut lines, "g / G", "First / last row");

    f.render_widget(Paragraph::new(lines), area);
}

fn section(lines: &mut Vec<Line<'_>>, title: &str) {
    lines.push(Line::from(Span::styled(title.to_string(), theme::accent_bold())));
}

fn key(lines: &mut Vec<Line<'_>>, keys: &str, desc: &str) {
    lines.push(Line::from(vec![
        Span::styled(format!("  {:>16}  ", keys), theme::accent()),
        Span::styled(desc.to_string(), theme::muted()),
    ]));
}
