// src/classification/classifier.rs
//
// Mainband / sideband classification.
//
// Every non-sideband track drives a search: points are sampled along it and
// four frequency windows are opened around each point. Co-sloped tracks of
// the same group that cross a window become partners:
//
//   far window (2x offset)   → lone sideband pair, driver is the other side
//   close windows (1x offset) → once both above and below are seen, the
//                               driver is a mainband flanked by sidebands
//
// Within a group, tracks are visited strictly in row order and each one sees
// every write made by the tracks before it. Groups never share candidates,
// so they may run in parallel.

use super::progress::{ProgressCounter, ProgressObserver};
use super::summary::ClassificationSummary;
use crate::dataset::{Group, TrackTable};
use crate::error::{ClassifyError, Result};
use crate::frequency::{main_frequency, side_frequency};
use crate::geometry::{approx_equal, build_windows, sample_points, segment_in_window, Point};
use crate::types::{BandType, ClassificationConfig, FarPairGroupIds, ToleranceRange, Track};
use rayon::prelude::*;
use tracing::{debug, info};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Upper bound on interior points per track; keeps sampling arithmetic in range
pub const MAX_POINTS_PER_TRACK: usize = 1_000_000;

#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    pub points_per_track: usize,
    pub slope_tolerance: f64,
    pub far_pair_group_ids: FarPairGroupIds,
    pub parallel_groups: bool,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self::from(&ClassificationConfig::default())
    }
}

impl From<&ClassificationConfig> for ClassifierSettings {
    fn from(config: &ClassificationConfig) -> Self {
        Self {
            points_per_track: config.points_per_track,
            slope_tolerance: config.slope_tolerance,
            far_pair_group_ids: config.far_pair_group_ids,
            parallel_groups: config.parallel_groups,
        }
    }
}

impl ClassifierSettings {
    pub fn validate(&self) -> Result<()> {
        if self.points_per_track == 0 {
            return Err(ClassifyError::config("points per track must be at least 1"));
        }
        if self.points_per_track > MAX_POINTS_PER_TRACK {
            return Err(ClassifyError::config(format!(
                "points per track must be at most {}, got {}",
                MAX_POINTS_PER_TRACK, self.points_per_track
            )));
        }
        if !(self.slope_tolerance.is_finite() && self.slope_tolerance > 0.0) {
            return Err(ClassifyError::config(format!(
                "slope tolerance must be a positive fraction, got {}",
                self.slope_tolerance
            )));
        }
        Ok(())
    }
}

fn validate_range(field: f64, range: &ToleranceRange) -> Result<()> {
    let ToleranceRange {
        min_offset_hz: min,
        max_offset_hz: max,
    } = *range;
    if !(min.is_finite() && max.is_finite()) || min <= 0.0 || min >= max {
        return Err(ClassifyError::config(format!(
            "field {}: tolerance range must satisfy 0 < min < max, got ({}, {})",
            field, min, max
        )));
    }
    Ok(())
}

// ============================================================================
// CLASSIFIER
// ============================================================================

pub struct Classifier {
    settings: ClassifierSettings,
}

impl Classifier {
    pub fn new(settings: ClassifierSettings) -> Self {
        Self { settings }
    }

    /// Classify every track of `table` in place.
    ///
    /// `ranges` holds one tolerance range per distinct field, in ascending
    /// field order. All configuration is checked before the first write.
    pub fn classify(
        &self,
        table: &mut TrackTable,
        ranges: &[ToleranceRange],
        observer: &dyn ProgressObserver,
    ) -> Result<ClassificationSummary> {
        self.settings.validate()?;

        let partitions = table.partition();
        if partitions.len() != ranges.len() {
            return Err(ClassifyError::config(format!(
                "{} tolerance range(s) given for {} field(s)",
                ranges.len(),
                partitions.len()
            )));
        }
        for (partition, range) in partitions.iter().zip(ranges) {
            validate_range(partition.field, range)?;
        }

        info!("Events to classify: {}", table.len());
        let progress = ProgressCounter::new(table.len(), observer);

        for (partition, range) in partitions.iter().zip(ranges) {
            info!(
                "Field {}: {} track(s) in {} group(s), axial range {:.3e}..{:.3e} Hz",
                partition.field,
                partition.track_count(),
                partition.groups.len(),
                range.min_offset_hz,
                range.max_offset_hz
            );

            let results: Vec<Vec<Track>> = if self.settings.parallel_groups {
                let shared: &TrackTable = table;
                partition
                    .groups
                    .par_iter()
                    .map(|group| self.classify_group(shared, group, *range, &progress))
                    .collect()
            } else {
                partition
                    .groups
                    .iter()
                    .map(|group| self.classify_group(table, group, *range, &progress))
                    .collect()
            };

            for (group, classified) in partition.groups.iter().zip(&results) {
                table.write_back(&group.members, classified);
            }
        }

        debug!("Classified {} track(s)", progress.processed());
        Ok(table.summary())
    }

    fn classify_group(
        &self,
        table: &TrackTable,
        group: &Group,
        range: ToleranceRange,
        progress: &ProgressCounter<'_>,
    ) -> Vec<Track> {
        let mut tracks = table.group_tracks(&group.members);
        let mut pass = GroupPass {
            tracks: &mut tracks,
            ids: &group.members,
            range,
            settings: &self.settings,
        };

        for driver in 0..group.members.len() {
            pass.drive(driver);
            progress.tick();
        }
        tracks
    }
}

// ============================================================================
// GROUP PASS
// ============================================================================

/// Sequential classification state for one group.
///
/// `tracks[i]` is the working copy of table row `ids[i]`.
struct GroupPass<'a> {
    tracks: &'a mut [Track],
    ids: &'a [usize],
    range: ToleranceRange,
    settings: &'a ClassifierSettings,
}

impl GroupPass<'_> {
    fn drive(&mut self, driver: usize) {
        if self.tracks[driver].band.is_side() {
            return;
        }
        let own_id = self.ids[driver];
        self.tracks[driver].group_id.get_or_insert(own_id);

        let (start, end, slope) = {
            let track = &self.tracks[driver];
            (track.start(), track.end(), track.slope)
        };
        let n = self.settings.points_per_track;

        let mut above: Vec<usize> = Vec::new();
        let mut below: Vec<usize> = Vec::new();

        for point in sample_points(n, start, end).skip(1).take(n) {
            let windows = build_windows(point, self.range);

            for candidate in 0..self.tracks.len() {
                if candidate == driver {
                    continue;
                }
                let other = &self.tracks[candidate];
                if !approx_equal(other.slope, slope, self.settings.slope_tolerance) {
                    continue;
                }
                let (c_start, c_end, c_slope) = (other.start(), other.end(), other.slope);

                if segment_in_window(c_start, c_end, &windows.far_below, c_slope) {
                    self.pair_far(driver, candidate, point, BandType::Lower);
                    continue;
                }
                if segment_in_window(c_start, c_end, &windows.far_above, c_slope) {
                    self.pair_far(driver, candidate, point, BandType::Upper);
                    continue;
                }

                if segment_in_window(c_start, c_end, &windows.close_above, c_slope) {
                    push_unique(&mut above, candidate);
                } else if segment_in_window(c_start, c_end, &windows.close_below, c_slope) {
                    push_unique(&mut below, candidate);
                }
            }

            if !above.is_empty() && !below.is_empty() {
                self.resolve_mainband(driver, &above, &below);
            }
        }
    }

    fn driver_group(&self, driver: usize) -> usize {
        self.tracks[driver].group_id.unwrap_or(self.ids[driver])
    }

    /// Bond the driver with a sideband two offsets away; the driver takes
    /// the opposite side.
    fn pair_far(&mut self, driver: usize, candidate: usize, at: Point, candidate_band: BandType) {
        let group_id = self.driver_group(driver);

        if self.tracks[candidate].band == BandType::Lone {
            self.tracks[candidate].group_id = Some(group_id);
        } else {
            match self.settings.far_pair_group_ids {
                FarPairGroupIds::KeepDriver => debug!(
                    "Track {} keeps group {} although partner {} is in group {:?}",
                    self.ids[driver], group_id, self.ids[candidate], self.tracks[candidate].group_id
                ),
                FarPairGroupIds::AdoptCandidate => {
                    if let Some(id) = self.tracks[candidate].group_id {
                        self.tracks[driver].group_id = Some(id);
                    }
                }
            }
        }

        let axial = side_frequency(&self.tracks[driver], &self.tracks[candidate], at);
        let driver_band = match candidate_band {
            BandType::Lower => BandType::Upper,
            _ => BandType::Lower,
        };

        self.tracks[candidate].band = candidate_band;
        self.tracks[candidate].axial_frequency = axial;
        self.tracks[driver].band = driver_band;
        self.tracks[driver].axial_frequency = axial;

        debug!(
            "Sideband pair: track {} {} / track {} {}, axial {:.4e} Hz",
            self.ids[driver], driver_band, self.ids[candidate], candidate_band, axial
        );
    }

    /// The driver is a mainband: every close candidate joins its set.
    fn resolve_mainband(&mut self, driver: usize, above: &[usize], below: &[usize]) {
        let axial = main_frequency(
            &self.tracks[driver],
            &self.tracks[above[0]],
            &self.tracks[below[0]],
        );
        let group_id = self.driver_group(driver);

        for (sides, band) in [(above, BandType::Upper), (below, BandType::Lower)] {
            for &side in sides {
                let track = &mut self.tracks[side];
                track.group_id = Some(group_id);
                track.band = band;
                track.axial_frequency = axial;
            }
        }

        let main = &mut self.tracks[driver];
        main.band = BandType::Main;
        main.axial_frequency = axial;

        debug!(
            "Mainband track {}: {} upper, {} lower, axial {:.4e} Hz",
            self.ids[driver],
            above.len(),
            below.len(),
            axial
        );
    }
}

fn push_unique(list: &mut Vec<usize>, index: usize) {
    if !list.contains(&index) {
        list.push(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::NoProgress;
    use std::sync::Mutex;

    const SLOPE: f64 = 1.0e6;

    fn range() -> ToleranceRange {
        ToleranceRange::new(1.0e6, 2.0e6)
    }

    /// Track on `t in [t0, t1]` with frequency `f0 + SLOPE * t`
    fn line(field: f64, file_id: i64, f0: f64, t0: f64, t1: f64) -> Track {
        sloped(field, file_id, f0, t0, t1, SLOPE)
    }

    fn sloped(field: f64, file_id: i64, f0: f64, t0: f64, t1: f64, slope: f64) -> Track {
        Track::new(
            field,
            7,
            file_id,
            Point::new(t0, f0 + slope * t0),
            Point::new(t1, f0 + slope * t1),
            slope,
        )
    }

    fn settings() -> ClassifierSettings {
        ClassifierSettings {
            points_per_track: 3,
            slope_tolerance: 0.05,
            far_pair_group_ids: FarPairGroupIds::KeepDriver,
            parallel_groups: false,
        }
    }

    fn classify(tracks: Vec<Track>, ranges: &[ToleranceRange]) -> TrackTable {
        let mut table = TrackTable::new(tracks);
        Classifier::new(settings())
            .classify(&mut table, ranges, &NoProgress)
            .unwrap();
        table
    }

    #[test]
    fn test_far_pair_becomes_upper_and_lower() {
        // 3 MHz apart: inside the far window (2..4 MHz)
        let a = line(3.0, 0, 100.0e6, 0.0, 10.0);
        let b = line(3.0, 0, 103.0e6, 0.0, 10.0);
        let expected = side_frequency(&a, &b, Point::new(2.5, 102.5e6));

        let table = classify(vec![a, b], &[range()]);
        let (a, b) = (table.get(0).unwrap(), table.get(1).unwrap());

        assert_eq!(a.band, BandType::Lower);
        assert_eq!(b.band, BandType::Upper);
        assert_eq!(a.group_id, Some(0));
        assert_eq!(b.group_id, Some(0));
        assert_eq!(a.axial_frequency, b.axial_frequency);
        assert_eq!(a.axial_frequency, expected);
        assert!((expected - 1.5e6).abs() < 1e-3);
    }

    #[test]
    fn test_far_pair_driver_above() {
        let a = line(3.0, 0, 103.0e6, 0.0, 10.0);
        let b = line(3.0, 0, 100.0e6, 0.0, 10.0);

        let table = classify(vec![a, b], &[range()]);
        assert_eq!(table.get(0).unwrap().band, BandType::Upper);
        assert_eq!(table.get(1).unwrap().band, BandType::Lower);
    }

    #[test]
    fn test_mainband_triple() {
        let main = line(3.0, 0, 100.0e6, 0.0, 10.0);
        let upper = line(3.0, 0, 101.5e6, 0.0, 10.0);
        let lower = line(3.0, 0, 98.5e6, 0.0, 10.0);

        let table = classify(vec![main, upper, lower], &[range()]);
        let tracks = table.tracks();

        assert_eq!(tracks[0].band, BandType::Main);
        assert_eq!(tracks[1].band, BandType::Upper);
        assert_eq!(tracks[2].band, BandType::Lower);
        for track in tracks {
            assert_eq!(track.group_id, Some(0));
            assert!((track.axial_frequency - 1.5e6).abs() < 1e-3);
        }
        assert_eq!(tracks[0].axial_frequency, tracks[1].axial_frequency);
        assert_eq!(tracks[0].axial_frequency, tracks[2].axial_frequency);
    }

    #[test]
    fn test_mainband_overrides_earlier_far_pair() {
        // The upper sideband comes first and pairs with the lower one through
        // the far window; the mainband then claims both.
        let upper = line(3.0, 0, 101.5e6, 0.0, 10.0);
        let main = line(3.0, 0, 100.0e6, 0.0, 10.0);
        let lower = line(3.0, 0, 98.5e6, 0.0, 10.0);

        let table = classify(vec![upper, main, lower], &[range()]);
        let tracks = table.tracks();

        assert_eq!(tracks[0].band, BandType::Upper);
        assert_eq!(tracks[1].band, BandType::Main);
        assert_eq!(tracks[2].band, BandType::Lower);
        // Mainband writes its own id over the pair's
        assert_eq!(tracks[0].group_id, Some(1));
        assert_eq!(tracks[1].group_id, Some(1));
        assert_eq!(tracks[2].group_id, Some(1));
    }

    #[test]
    fn test_single_track_stays_lone() {
        let table = classify(
            vec![
                line(3.0, 0, 100.0e6, 0.0, 10.0),
                line(3.0, 1, 100.0e6, 0.0, 10.0),
            ],
            &[range()],
        );

        for (index, track) in table.tracks().iter().enumerate() {
            assert_eq!(track.band, BandType::Lone);
            assert_eq!(track.group_id, Some(index));
            assert_eq!(track.axial_frequency, 0.0);
        }
    }

    #[test]
    fn test_groups_are_isolated() {
        // Would be a far pair, but the files differ
        let table = classify(
            vec![
                line(3.0, 0, 100.0e6, 0.0, 10.0),
                line(3.0, 1, 103.0e6, 0.0, 10.0),
            ],
            &[range()],
        );
        assert!(table.tracks().iter().all(|t| t.band == BandType::Lone));
    }

    #[test]
    fn test_slope_mismatch_never_pairs() {
        let a = sloped(3.0, 0, 100.0e6, 0.0, 10.0, SLOPE);
        let b = sloped(3.0, 0, 103.0e6, 0.0, 10.0, SLOPE * 1.1);

        let table = classify(vec![a, b], &[range()]);
        assert!(table.tracks().iter().all(|t| t.band == BandType::Lone));
        assert!(table.tracks().iter().all(|t| t.axial_frequency == 0.0));
    }

    #[test]
    fn test_close_only_on_one_side_stays_lone() {
        // 1.5 MHz apart is a close match, which alone never classifies
        let table = classify(
            vec![
                line(3.0, 0, 100.0e6, 0.0, 10.0),
                line(3.0, 0, 101.5e6, 0.0, 10.0),
            ],
            &[range()],
        );
        assert!(table.tracks().iter().all(|t| t.band == BandType::Lone));
    }

    #[test]
    fn test_sidebands_are_not_drivers() {
        let mut table = TrackTable::new(vec![
            line(3.0, 0, 100.0e6, 0.0, 10.0),
            line(3.0, 0, 103.0e6, 0.0, 10.0),
        ]);
        let group = table.partition().remove(0).groups.remove(0);
        let mut tracks = table.group_tracks(&group.members);
        tracks[0].band = BandType::Upper;
        table.write_back(&group.members, &tracks);

        Classifier::new(settings())
            .classify(&mut table, &[range()], &NoProgress)
            .unwrap();

        // Track 0 never drives, so it never receives a group id of its own;
        // track 1 drives and finds track 0 far below.
        let tracks = table.tracks();
        assert_eq!(tracks[0].band, BandType::Lower);
        assert_eq!(tracks[1].band, BandType::Upper);
        assert_eq!(tracks[1].group_id, Some(1));
        assert_eq!(tracks[0].group_id, None);
    }

    #[test]
    fn test_far_pair_keeps_driver_group_for_claimed_partner() {
        // Row 0 pairs with row 1 (far). Row 2 ends before row 0 starts, so
        // row 0 cannot see it; row 2 then finds row 0, already claimed, in
        // its far window.
        let tracks = vec![
            line(3.0, 0, 103.0e6, 5.0, 10.0),
            line(3.0, 0, 100.0e6, 5.0, 10.0),
            line(3.0, 0, 106.0e6, 0.0, 4.0),
        ];

        let table = classify(tracks.clone(), &[range()]);
        assert_eq!(table.get(2).unwrap().group_id, Some(2));
        assert_eq!(table.get(0).unwrap().group_id, Some(0));

        let mut table = TrackTable::new(tracks);
        let settings = ClassifierSettings {
            far_pair_group_ids: FarPairGroupIds::AdoptCandidate,
            ..settings()
        };
        Classifier::new(settings)
            .classify(&mut table, &[range()], &NoProgress)
            .unwrap();
        assert_eq!(table.get(2).unwrap().group_id, Some(0));
    }

    #[test]
    fn test_each_field_uses_its_own_range() {
        // Same 3 MHz gap; a far pair only under the first field's range
        let tracks = vec![
            line(1.0, 0, 100.0e6, 0.0, 10.0),
            line(1.0, 0, 103.0e6, 0.0, 10.0),
            line(2.0, 0, 100.0e6, 0.0, 10.0),
            line(2.0, 0, 103.0e6, 0.0, 10.0),
        ];
        let table = classify(tracks, &[range(), ToleranceRange::new(5.0e6, 6.0e6)]);

        assert_eq!(table.get(0).unwrap().band, BandType::Lower);
        assert_eq!(table.get(1).unwrap().band, BandType::Upper);
        assert_eq!(table.get(2).unwrap().band, BandType::Lone);
        assert_eq!(table.get(3).unwrap().band, BandType::Lone);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut tracks = Vec::new();
        for file_id in 0..8 {
            tracks.push(line(3.0, file_id, 101.5e6, 0.0, 10.0));
            tracks.push(line(3.0, file_id, 100.0e6, 0.0, 10.0));
            tracks.push(line(3.0, file_id, 98.5e6, 0.0, 10.0));
            tracks.push(line(3.0, file_id, 120.0e6, 0.0, 10.0));
        }

        let sequential = classify(tracks.clone(), &[range()]);

        let mut parallel = TrackTable::new(tracks);
        let settings = ClassifierSettings {
            parallel_groups: true,
            ..settings()
        };
        Classifier::new(settings)
            .classify(&mut parallel, &[range()], &NoProgress)
            .unwrap();

        assert_eq!(sequential.tracks(), parallel.tracks());
    }

    #[test]
    fn test_range_count_mismatch_is_rejected_before_mutation() {
        let mut table = TrackTable::new(vec![
            line(1.0, 0, 100.0e6, 0.0, 10.0),
            line(2.0, 0, 103.0e6, 0.0, 10.0),
        ]);
        let err = Classifier::new(settings())
            .classify(&mut table, &[range()], &NoProgress)
            .unwrap_err();

        assert!(matches!(err, ClassifyError::Configuration(_)));
        assert!(table.tracks().iter().all(|t| t.group_id.is_none()));
    }

    #[test]
    fn test_observer_sees_every_track() {
        struct Recorder(Mutex<Vec<(usize, usize)>>);

        impl ProgressObserver for Recorder {
            fn report(&self, processed: usize, total: usize) {
                self.0.lock().unwrap().push((processed, total));
            }
        }

        // Rows 0 and 1 form a far pair, so row 1 is skipped as a driver;
        // row 2 sits alone in another file.
        let mut table = TrackTable::new(vec![
            line(3.0, 0, 100.0e6, 0.0, 10.0),
            line(3.0, 0, 103.0e6, 0.0, 10.0),
            line(3.0, 1, 100.0e6, 0.0, 10.0),
        ]);
        let recorder = Recorder(Mutex::new(Vec::new()));
        let settings = ClassifierSettings {
            parallel_groups: true,
            ..settings()
        };
        Classifier::new(settings)
            .classify(&mut table, &[range()], &recorder)
            .unwrap();

        let mut reports = recorder.0.into_inner().unwrap();
        reports.sort();
        assert_eq!(reports, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(table.get(1).unwrap().band, BandType::Upper);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut table = TrackTable::new(vec![line(1.0, 0, 100.0e6, 0.0, 10.0)]);
        let zero_points = ClassifierSettings {
            points_per_track: 0,
            ..settings()
        };
        assert!(Classifier::new(zero_points)
            .classify(&mut table, &[range()], &NoProgress)
            .is_err());

        let too_many_points = ClassifierSettings {
            points_per_track: usize::MAX,
            ..settings()
        };
        assert!(matches!(
            Classifier::new(too_many_points).classify(&mut table, &[range()], &NoProgress),
            Err(ClassifyError::Configuration(_))
        ));

        let inverted = ToleranceRange::new(2.0e6, 1.0e6);
        assert!(Classifier::new(settings())
            .classify(&mut table, &[inverted], &NoProgress)
            .is_err());
    }
}
