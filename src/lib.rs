// src/lib.rs
//
// Mainband / sideband classification of CRES tracks.
//
// Signal flow:
//   CSV rows → io::read_tracks → TrackTable ─┐
//   Config (YAML + CLI) → tolerance ranges ──┼→ Classifier → TrackTable → io::write_tracks
//                                            └→ ClassificationSummary
//   Classified CSV → histogram::histograms_from_csv → per-field bins

pub mod classification;
pub mod config;
pub mod dataset;
pub mod error;
pub mod frequency;
pub mod geometry;
pub mod histogram;
pub mod io;
pub mod types;

pub use classification::{
    ClassificationSummary, Classifier, ClassifierSettings, LogProgress, NoProgress,
    ProgressObserver,
};
pub use dataset::{FieldPartition, Group, TrackTable};
pub use error::{ClassifyError, Result};
pub use geometry::Point;
pub use types::{BandType, Config, FarPairGroupIds, ToleranceRange, Track};
