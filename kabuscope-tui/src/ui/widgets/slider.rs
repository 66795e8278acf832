//! Range slider drawn under the interactive chart.
//!
//! Row 0 is the track: the selected window is filled, the two handles are
//! bars. Row 1 carries the dates at the window ends. Mouse hits are mapped
//! back onto the track with [`track_fraction`].

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::Widget;

use kabuscope_core::render::RangeSlider;

use crate::theme;

const TRACK: &str = "─";
const FILL: &str = "━";
const HANDLE: &str = "┃";

pub struct RangeSliderWidget<'a> {
    slider: &'a RangeSlider,
    start_label: String,
    end_label: String,
}

impl<'a> RangeSliderWidget<'a> {
    pub fn new(slider: &'a RangeSlider) -> Self {
        Self {
            slider,
            start_label: String::new(),
            end_label: String::new(),
        }
    }

    pub fn labels(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_label = start.into();
        self.end_label = end.into();
        self
    }
}

/// Horizontal position of `column` along `track`, in `[0, 1]`.
pub fn track_fraction(track: Rect, column: u16) -> f64 {
    if track.width <= 1 {
        return 0.0;
    }
    let offset = column.saturating_sub(track.x).min(track.width - 1);
    f64::from(offset) / f64::from(track.width - 1)
}

/// Screen column of a track position.
pub fn column_of(track: Rect, fraction: f64) -> u16 {
    if track.width <= 1 {
        return track.x;
    }
    let fraction = fraction.clamp(0.0, 1.0);
    track.x + (fraction * f64::from(track.width - 1)).round() as u16
}

/// Whether a mouse position falls on the track row.
pub fn hit(track: Rect, column: u16, row: u16) -> bool {
    row == track.y && column >= track.x && column < track.x + track.width
}

impl Widget for RangeSliderWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let track = Rect { height: 1, ..area };

        if self.slider.is_empty() {
            for x in track.x..track.x + track.width {
                buf.set_string(x, track.y, TRACK, theme::muted());
            }
            return;
        }

        let start_col = column_of(track, self.slider.fraction_of(self.slider.start()));
        let end_col = column_of(track, self.slider.fraction_of(self.slider.end()));
        for x in track.x..track.x + track.width {
            let (symbol, style) = if x == start_col || x == end_col {
                (HANDLE, theme::neutral())
            } else if x > start_col && x < end_col {
                (FILL, theme::accent())
            } else {
                (TRACK, theme::muted())
            };
            buf.set_string(x, track.y, symbol, style);
        }

        if area.height > 1 {
            let y = area.y + 1;
            buf.set_string(area.x, y, &self.start_label, theme::secondary());
            let width = self.end_label.chars().count() as u16;
            if width <= area.width {
                let x = area.x + area.width - width;
                buf.set_string(x, y, &self.end_label, theme::secondary());
            }
        }
    }
}
