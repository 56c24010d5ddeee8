// src/config.rs

use crate::classification::MAX_POINTS_PER_TRACK;
use crate::error::{ClassifyError, Result};
use crate::types::{Config, ToleranceConfig, ToleranceRange};
use std::fs;
use std::path::Path;
use tracing::warn;

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Replace the tolerance list with parallel MHz lists, as typed at the
    /// command line (`--min-mhz 60 70 --max-mhz 120 140`).
    pub fn set_tolerances_mhz(&mut self, min_mhz: &[f64], max_mhz: &[f64]) -> Result<()> {
        if min_mhz.len() != max_mhz.len() {
            return Err(ClassifyError::config(format!(
                "{} minimum and {} maximum axial frequencies given",
                min_mhz.len(),
                max_mhz.len()
            )));
        }
        self.tolerances = min_mhz
            .iter()
            .zip(max_mhz)
            .map(|(&min_mhz, &max_mhz)| ToleranceConfig {
                field: None,
                min_mhz,
                max_mhz,
            })
            .collect();
        Ok(())
    }

    /// Settings that do not depend on the data
    pub fn validate(&self) -> Result<()> {
        let classification = &self.classification;
        if classification.points_per_track == 0 {
            return Err(ClassifyError::config("points_per_track must be at least 1"));
        }
        if classification.points_per_track > MAX_POINTS_PER_TRACK {
            return Err(ClassifyError::config(format!(
                "points_per_track must be at most {}",
                MAX_POINTS_PER_TRACK
            )));
        }
        if !(classification.slope_tolerance > 0.0 && classification.slope_tolerance.is_finite()) {
            return Err(ClassifyError::config("slope_tolerance must be positive"));
        }
        if !(self.progress.interval_percent > 0.0) {
            return Err(ClassifyError::config("progress.interval_percent must be positive"));
        }
        Ok(())
    }

    /// Pair the configured tolerances with the distinct fields of the data.
    ///
    /// `fields` must be ascending; entries are matched by position.
    pub fn tolerance_ranges(&self, fields: &[f64]) -> Result<Vec<ToleranceRange>> {
        if self.tolerances.len() != fields.len() {
            return Err(ClassifyError::config(format!(
                "{} tolerance range(s) configured but the data has {} field(s): {:?}",
                self.tolerances.len(),
                fields.len(),
                fields
            )));
        }

        let mut ranges = Vec::with_capacity(fields.len());
        for (entry, &field) in self.tolerances.iter().zip(fields) {
            if let Some(pinned) = entry.field {
                if pinned != field {
                    return Err(ClassifyError::config(format!(
                        "tolerance pinned to field {} but field {} is at that position",
                        pinned, field
                    )));
                }
            }
            if !(entry.min_mhz > 0.0 && entry.min_mhz < entry.max_mhz) {
                return Err(ClassifyError::config(format!(
                    "field {}: need 0 < min_mhz < max_mhz, got {}..{}",
                    field, entry.min_mhz, entry.max_mhz
                )));
            }
            if entry.max_mhz >= 2.0 * entry.min_mhz {
                warn!(
                    "Field {}: close and far windows overlap ({}..{} MHz)",
                    field, entry.min_mhz, entry.max_mhz
                );
            }
            ranges.push(ToleranceRange::from_mhz(entry.min_mhz, entry.max_mhz));
        }
        Ok(ranges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from(yaml: &str) -> Config {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_yaml_sections() {
        let config = config_from(
            r#"
classification:
  points_per_track: 4
  far_pair_group_ids: adopt_candidate
  parallel_groups: false
tolerances:
  - { min_mhz: 60, max_mhz: 110 }
  - { field: 1.5, min_mhz: 70, max_mhz: 130 }
logging:
  level: debug
"#,
        );

        assert_eq!(config.classification.points_per_track, 4);
        assert_eq!(config.classification.slope_tolerance, 0.05);
        assert!(!config.classification.parallel_groups);
        assert_eq!(config.tolerances.len(), 2);
        assert_eq!(config.tolerances[1].field, Some(1.5));
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());

        let ranges = config.tolerance_ranges(&[1.0, 1.5]).unwrap();
        assert_eq!(ranges[0], ToleranceRange::new(60.0e6, 110.0e6));
        assert_eq!(ranges[1], ToleranceRange::new(70.0e6, 130.0e6));
    }

    #[test]
    fn test_range_count_must_match_fields() {
        let mut config = Config::default();
        config.set_tolerances_mhz(&[60.0], &[110.0]).unwrap();
        let err = config.tolerance_ranges(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, ClassifyError::Configuration(_)));
    }

    #[test]
    fn test_pinned_field_must_match() {
        let config = config_from("tolerances:\n  - { field: 2.0, min_mhz: 60, max_mhz: 110 }\n");
        assert!(config.tolerance_ranges(&[1.0]).is_err());
        assert!(config.tolerance_ranges(&[2.0]).is_ok());
    }

    #[test]
    fn test_mismatched_cli_lists() {
        let mut config = Config::default();
        assert!(config.set_tolerances_mhz(&[60.0, 70.0], &[110.0]).is_err());
    }

    #[test]
    fn test_inverted_range_rejected() {
        let mut config = Config::default();
        config.set_tolerances_mhz(&[110.0], &[60.0]).unwrap();
        assert!(config.tolerance_ranges(&[1.0]).is_err());
    }

    #[test]
    fn test_points_per_track_bounds() {
        let mut config = Config::default();
        config.classification.points_per_track = 0;
        assert!(config.validate().is_err());

        config.classification.points_per_track = usize::MAX;
        assert!(config.validate().is_err());
    }
}
