// src/geometry.rs
//
// Line-segment primitives in the time-frequency plane. Time is on x,
// frequency (Hz) on y.

use crate::types::ToleranceRange;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub time: f64,
    pub freq: f64,
}

impl Point {
    pub fn new(time: f64, freq: f64) -> Self {
        Self { time, freq }
    }
}

/// Vertical frequency interval at a single time, `low.freq <= high.freq`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub low: Point,
    pub high: Point,
}

impl Window {
    fn at(time: f64, low_freq: f64, high_freq: f64) -> Self {
        Self {
            low: Point::new(time, low_freq),
            high: Point::new(time, high_freq),
        }
    }

    pub fn time(&self) -> f64 {
        self.low.time
    }

    pub fn contains(&self, freq: f64) -> bool {
        freq >= self.low.freq && freq <= self.high.freq
    }
}

/// The four sideband search windows around one sample point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchWindows {
    pub close_above: Window,
    pub close_below: Window,
    pub far_above: Window,
    pub far_below: Window,
}

/// `n + 2` equally spaced points from `start` to `end`, endpoints included.
///
/// Interior points are `sample_points(n, ..).skip(1).take(n)`.
pub fn sample_points(n: usize, start: Point, end: Point) -> impl ExactSizeIterator<Item = Point> {
    let steps = (n + 1) as f64;
    let time_gap = (end.time - start.time) / steps;
    let freq_gap = (end.freq - start.freq) / steps;

    (0..n + 2).map(move |i| {
        let i = i as f64;
        Point::new(start.time + time_gap * i, start.freq + freq_gap * i)
    })
}

/// Build the close (one offset) and far (two offsets) windows above and
/// below `at`.
pub fn build_windows(at: Point, range: ToleranceRange) -> SearchWindows {
    let ToleranceRange {
        min_offset_hz: min,
        max_offset_hz: max,
    } = range;
    let (x, y) = (at.time, at.freq);

    SearchWindows {
        close_above: Window::at(x, y + min, y + max),
        close_below: Window::at(x, y - max, y - min),
        far_above: Window::at(x, y + 2.0 * min, y + 2.0 * max),
        far_below: Window::at(x, y - 2.0 * max, y - 2.0 * min),
    }
}

/// Whether the candidate segment passes through `window`.
///
/// The candidate's line is evaluated at the window's time. Values above the
/// candidate's measured end frequency are rejected so a track is never
/// extended past where it was observed.
pub fn segment_in_window(start: Point, end: Point, window: &Window, slope: f64) -> bool {
    let freq = slope * (window.time() - start.time) + start.freq;
    if freq > end.freq {
        return false;
    }
    window.contains(freq)
}

/// True unless either value exceeds the other by more than `tolerance`
/// (a fraction, e.g. `0.05`).
pub fn approx_equal(a: f64, b: f64, tolerance: f64) -> bool {
    let factor = 1.0 + tolerance;
    !(a >= factor * b || b >= factor * a)
}
