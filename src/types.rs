// src/types.rs

use crate::geometry::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub classification: ClassificationConfig,
    /// One entry per distinct field, in ascending field order
    pub tolerances: Vec<ToleranceConfig>,
    pub histogram: HistogramConfig,
    pub progress: ProgressConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Interior points sampled along every driving track
    pub points_per_track: usize,
    /// Fractional slope difference allowed between partners
    pub slope_tolerance: f64,
    pub far_pair_group_ids: FarPairGroupIds,
    /// Classify independent groups on the rayon pool
    pub parallel_groups: bool,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            points_per_track: 10,
            slope_tolerance: 0.05,
            far_pair_group_ids: FarPairGroupIds::KeepDriver,
            parallel_groups: true,
        }
    }
}

/// What happens to the driving track's group id when a far partner
/// already belongs to another set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FarPairGroupIds {
    /// Driver keeps its own id; the two tracks end up in different sets.
    #[default]
    KeepDriver,
    /// Driver takes over the partner's id.
    AdoptCandidate,
}

/// Axial frequency search range for one field, in MHz.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToleranceConfig {
    /// Optional pin to a field value; checked against the data when present
    #[serde(default)]
    pub field: Option<f64>,
    pub min_mhz: f64,
    pub max_mhz: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    pub min_hz: f64,
    pub max_hz: f64,
    pub bins: usize,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            min_hz: 4.0e7,
            max_hz: 5.0e8,
            bins: 75,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    pub interval_percent: f64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            interval_percent: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ============================================================================
// TRACKS
// ============================================================================

/// Axial frequency search range for one field, in Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceRange {
    pub min_offset_hz: f64,
    pub max_offset_hz: f64,
}

impl ToleranceRange {
    pub fn new(min_offset_hz: f64, max_offset_hz: f64) -> Self {
        Self {
            min_offset_hz,
            max_offset_hz,
        }
    }

    pub fn from_mhz(min_mhz: f64, max_mhz: f64) -> Self {
        Self::new(min_mhz * 1.0e6, max_mhz * 1.0e6)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BandType {
    Main,
    Upper,
    Lower,
    Lone,
}

impl BandType {
    /// Integer encoding used in the `Band_type` column
    pub fn code(&self) -> i8 {
        match self {
            Self::Main => 0,
            Self::Upper => 1,
            Self::Lower => -1,
            Self::Lone => 2,
        }
    }

    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            0 => Some(Self::Main),
            1 => Some(Self::Upper),
            -1 => Some(Self::Lower),
            2 => Some(Self::Lone),
            _ => None,
        }
    }

    /// Upper and lower sidebands never drive a search of their own
    pub fn is_side(&self) -> bool {
        matches!(self, Self::Upper | Self::Lower)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "MAIN",
            Self::Upper => "UPPER",
            Self::Lower => "LOWER",
            Self::Lone => "LONE",
        }
    }
}

impl fmt::Display for BandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(run_id, file_id)`: the acquisition a track came from
pub type GroupKey = (i64, i64);

/// One detected linear segment in the time-frequency plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub field: f64,
    pub run_id: i64,
    pub file_id: i64,
    pub start_time: f64,
    pub end_time: f64,
    pub start_freq: f64,
    pub end_freq: f64,
    pub slope: f64,

    pub band: BandType,
    /// `None` until the track is claimed by a set
    pub group_id: Option<usize>,
    pub axial_frequency: f64,
}

impl Track {
    pub fn new(field: f64, run_id: i64, file_id: i64, start: Point, end: Point, slope: f64) -> Self {
        Self {
            field,
            run_id,
            file_id,
            start_time: start.time,
            end_time: end.time,
            start_freq: start.freq,
            end_freq: end.freq,
            slope,
            band: BandType::Lone,
            group_id: None,
            axial_frequency: 0.0,
        }
    }

    pub fn start(&self) -> Point {
        Point::new(self.start_time, self.start_freq)
    }

    pub fn end(&self) -> Point {
        Point::new(self.end_time, self.end_freq)
    }

    pub fn group_key(&self) -> GroupKey {
        (self.run_id, self.file_id)
    }

    /// Frequency of the track's line at `time`, extrapolating if needed
    pub fn freq_at(&self, time: f64) -> f64 {
        self.slope * (time - self.start_time) + self.start_freq
    }
}
