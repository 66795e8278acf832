//! Neon-on-charcoal palette and the styles built from it.
//!
//! - **Accent**: electric cyan (focus, the close-price line)
//! - **Positive / Negative**: green / pink (up and down days)
//! - **Warning**: orange (per-company load failures)
//! - **Neutral**: purple (slider handles)
//! - **Muted**: steel blue (hints, axes)

use ratatui::style::{Color, Modifier, Style};

pub const ACCENT: Color = Color::Rgb(0, 255, 255);
pub const POSITIVE: Color = Color::Rgb(0, 255, 128);
pub const NEGATIVE: Color = Color::Rgb(255, 20, 147);
pub const WARNING: Color = Color::Rgb(255, 140, 0);
pub const NEUTRAL: Color = Color::Rgb(147, 112, 219);
pub const MUTED: Color = Color::Rgb(100, 149, 237);
pub const TEXT_PRIMARY: Color = Color::White;
pub const TEXT_SECONDARY: Color = Color::Rgb(170, 170, 170);

pub fn accent() -> Style {
    Style::default().fg(ACCENT)
}

pub fn accent_bold() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn positive() -> Style {
    Style::default().fg(POSITIVE)
}

pub fn negative() -> Style {
    Style::default().fg(NEGATIVE)
}

pub fn warning() -> Style {
    Style::default().fg(WARNING)
}

pub fn neutral() -> Style {
    Style::default().fg(NEUTRAL)
}

pub fn muted() -> Style {
    Style::default().fg(MUTED)
}

pub fn text() -> Style {
    Style::default().fg(TEXT_PRIMARY)
}

pub fn secondary() -> Style {
    Style::default().fg(TEXT_SECONDARY)
}

/// Highlight for the row under the cursor.
pub fn selected(focused: bool) -> Style {
    if focused {
        Style::default()
            .fg(Color::Black)
            .bg(ACCENT)
            .add_modifier(Modifier::BOLD)
    } else {
        text()
    }
}

pub fn panel_border(active: bool) -> Style {
    if active {
        accent()
    } else {
        muted()
    }
}

pub fn panel_title(active: bool) -> Style {
    if active {
        accent_bold()
    } else {
        muted()
    }
}

/// Green for gains, pink for losses.
pub fn change_color(value: f64) -> Color {
    if value >= 0.0 {
        POSITIVE
    } else {
        NEGATIVE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_color_by_sign() {
        assert_eq!(change_color(1.5), POSITIVE);
        assert_eq!(change_color(0.0), POSITIVE);
        assert_eq!(change_color(-0.25), NEGATIVE);
    }

    #[test]
    fn active_panel_is_accented() {
        assert_eq!(panel_border(true).fg, Some(ACCENT));
        assert_eq!(panel_border(false).fg, Some(MUTED));
    }
}
