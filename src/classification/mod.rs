// src/classification/mod.rs
//
// Band classification pass.
//
//   TrackTable ── partition() ──► field ► group ► driver track
//                                                   │
//                       sample_points / build_windows / segment_in_window
//                                                   │
//                           far pair ──► side_frequency
//                           close pair ─► main_frequency
//                                                   │
//   TrackTable ◄── write_back() ────────────────────┘

pub mod classifier;
pub mod progress;
pub mod summary;

pub use classifier::{Classifier, ClassifierSettings, MAX_POINTS_PER_TRACK};
pub use progress::{LogProgress, NoProgress, ProgressObserver};
pub use summary::ClassificationSummary;
