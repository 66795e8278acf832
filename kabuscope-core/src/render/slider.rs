//! Range slider over the points of a chart.
//!
//! The window is an inclusive index range `[start, end]` into the series and
//! always holds at least one point. Keyboard panning and resizing move it by
//! whole points; a mouse drag maps a horizontal fraction onto an index.

/// One end of the slider window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSlider {
    len: usize,
    start: usize,
    end: usize,
}

impl RangeSlider {
    /// A slider covering all `len` points.
    pub fn new(len: usize) -> Self {
        Self {
            len,
            start: 0,
            end: len.saturating_sub(1),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Half-open `start..end + 1` for slicing the series.
    pub fn window(&self) -> std::ops::Range<usize> {
        if self.len == 0 {
            0..0
        } else {
            self.start..self.end + 1
        }
    }

    pub fn is_full(&self) -> bool {
        self.len == 0 || (self.start == 0 && self.end + 1 == self.len)
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.len);
    }

    /// Reset to the full range when the series length changes.
    pub fn resize_series(&mut self, len: usize) {
        if len != self.len {
            *self = Self::new(len);
        }
    }

    fn last(&self) -> usize {
        self.len.saturating_sub(1)
    }

    /// Shift the window by `delta` points, stopping at either end.
    pub fn pan(&mut self, delta: isize) {
        if self.len == 0 {
            return;
        }
        let width = self.end - self.start;
        let max_start = self.last() - width;
        let start = (self.start as isize + delta).clamp(0, max_start as isize) as usize;
        self.start = start;
        self.end = start + width;
    }

    /// Grow (`delta > 0`) or shrink the window symmetrically by `delta` points per side.
    pub fn zoom(&mut self, delta: isize) {
        if self.len == 0 {
            return;
        }
        let last = self.last() as isize;
        let mut start = (self.start as isize - delta).clamp(0, last);
        let mut end = (self.end as isize + delta).clamp(0, last);
        if start > end {
            let mid = (self.start + self.end) as isize / 2;
            start = mid;
            end = mid;
        }
        self.start = start as usize;
        self.end = end as usize;
    }

    /// Move one handle by `delta` points without crossing the other.
    pub fn nudge(&mut self, handle: Handle, delta: isize) {
        if self.len == 0 {
            return;
        }
        match handle {
            Handle::Start => {
                self.start = (self.start as isize + delta).clamp(0, self.end as isize) as usize;
            }
            Handle::End => {
                self.end = (self.end as isize + delta)
                    .clamp(self.start as isize, self.last() as isize)
                    as usize;
            }
        }
    }

    /// Index under a horizontal position `fraction` in `[0, 1]` of the track.
    pub fn index_at(&self, fraction: f64) -> usize {
        let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        (fraction * self.last() as f64).round() as usize
    }

    /// Track position of an index, in `[0, 1]`.
    pub fn fraction_of(&self, index: usize) -> f64 {
        if self.len <= 1 {
            0.0
        } else {
            index.min(self.last()) as f64 / self.last() as f64
        }
    }

    /// Handle closest to a track position.
    pub fn nearest_handle(&self, fraction: f64) -> Handle {
        let index = self.index_at(fraction);
        if index.abs_diff(self.start) <= index.abs_diff(self.end) {
            Handle::Start
        } else {
            Handle::End
        }
    }

    /// Place `handle` at a track position, without crossing the other handle.
    pub fn drag(&mut self, handle: Handle, fraction: f64) {
        if self.len == 0 {
            return;
        }
        let index = self.index_at(fraction);
        match handle {
            Handle::Start => self.start = index.min(self.end),
            Handle::End => self.end = index.max(self.start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_full() {
        let s = RangeSlider::new(10);
        assert!(s.is_full());
        assert_eq!(s.window(), 0..10);
    }

    #[test]
    fn empty_series_is_inert() {
        let mut s = RangeSlider::new(0);
        s.pan(3);
        s.zoom(-2);
        s.drag(Handle::End, 0.5);
        assert_eq!(s.window(), 0..0);
        assert!(s.is_full());
    }

    #[test]
    fn pan_keeps_width_and_stops_at_edges() {
        let mut s = RangeSlider::new(10);
        s.zoom(-3);
        assert_eq!(s.window(), 3..7);
        s.pan(100);
        assert_eq!(s.window(), 6..10);
        s.pan(-100);
        assert_eq!(s.window(), 0..4);
    }

    #[test]
    fn zoom_never_empties_window() {
        let mut s = RangeSlider::new(5);
        s.zoom(-10);
        assert_eq!(s.window().len(), 1);
        s.zoom(10);
        assert!(s.is_full());
    }

    #[test]
    fn drag_maps_fraction_to_index() {
        let mut s = RangeSlider::new(11);
        s.drag(Handle::Start, 0.3);
        assert_eq!(s.start(), 3);
        s.drag(Handle::End, 0.5);
        assert_eq!(s.end(), 5);
        // cannot cross the start handle
        s.drag(Handle::End, 0.1);
        assert_eq!(s.end(), 3);
    }

    #[test]
    fn nearest_handle_picks_closer_end() {
        let mut s = RangeSlider::new(11);
        s.drag(Handle::Start, 0.2);
        s.drag(Handle::End, 0.8);
        assert_eq!(s.nearest_handle(0.1), Handle::Start);
        assert_eq!(s.nearest_handle(0.9), Handle::End);
        assert!((s.fraction_of(s.end()) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn nudge_respects_other_handle() {
        let mut s = RangeSlider::new(10);
        s.nudge(Handle::Start, 20);
        assert_eq!(s.start(), 9);
        s.nudge(Handle::End, -5);
        assert_eq!(s.end(), 9);
    }

    #[test]
    fn resize_series_resets_on_length_change() {
        let mut s = RangeSlider::new(10);
        s.zoom(-2);
        s.resize_series(10);
        assert!(!s.is_full());
        s.resize_series(12);
        assert!(s.is_full());
        assert_eq!(s.len(), 12);
    }
}
