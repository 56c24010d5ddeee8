// src/frequency.rs
//
// Axial frequency derivation for classified sets.

use crate::geometry::Point;
use crate::types::Track;

/// Half the vertical gap between two sidebands at `at.time`.
///
/// Used for a sideband pair whose mainband was never detected.
pub fn side_frequency(above: &Track, below: &Track, at: Point) -> f64 {
    let top = above.freq_at(at.time);
    let bottom = below.freq_at(at.time);
    ((top - bottom) / 2.0).abs()
}

/// Mean separation of a mainband from its upper and lower sidebands.
///
/// Each separation is measured at the second-earliest of the four boundary
/// times of the pair, which lies inside the overlap when the tracks overlap.
///
/// The lower sideband's line is anchored on the upper sideband's start
/// frequency. Keep it that way: existing result sets were produced with
/// this formula.
pub fn main_frequency(main: &Track, above: &Track, below: &Track) -> f64 {
    let x = second_earliest([
        above.start_time,
        above.end_time,
        main.start_time,
        main.end_time,
    ]);
    let upper_delta = above.freq_at(x) - main.freq_at(x);

    let x = second_earliest([
        below.start_time,
        below.end_time,
        main.start_time,
        main.end_time,
    ]);
    let lower_freq = below.slope * (x - below.start_time) + above.start_freq;
    let lower_delta = main.freq_at(x) - lower_freq;

    (upper_delta.abs() + lower_delta.abs()) / 2.0
}

fn second_earliest(mut times: [f64; 4]) -> f64 {
    times.sort_by(|a, b| a.total_cmp(b));
    times[1]
}
