// src/classification/summary.rs

use crate::types::{BandType, Track};
use serde::Serialize;
use tracing::info;

/// Band counts after a classification pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassificationSummary {
    pub total_tracks: usize,
    pub mainbands: usize,
    pub lone: usize,
    pub lone_fraction: f64,
    pub lower_bands: usize,
    pub upper_bands: usize,
}

impl ClassificationSummary {
    pub fn from_tracks(tracks: &[Track]) -> Self {
        let mut summary = Self {
            total_tracks: tracks.len(),
            ..Self::default()
        };

        for track in tracks {
            match track.band {
                BandType::Main => summary.mainbands += 1,
                BandType::Upper => summary.upper_bands += 1,
                BandType::Lower => summary.lower_bands += 1,
                BandType::Lone => summary.lone += 1,
            }
        }

        if summary.total_tracks > 0 {
            summary.lone_fraction = summary.lone as f64 / summary.total_tracks as f64;
        }
        summary
    }

    pub fn log(&self) {
        info!("Mainbands: {}", self.mainbands);
        info!("Lone tracks: {}", self.lone);
        info!("Lone fraction of tracks: {:.4}", self.lone_fraction);
        info!("Lower bands: {}", self.lower_bands);
        info!("Upper bands: {}", self.upper_bands);
    }
}
