// src/dataset.rs
//
// Owns the track table and its field/group partitioning.

use crate::classification::ClassificationSummary;
use crate::types::{GroupKey, Track};
use csv::StringRecord;
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;

/// Tracks from one `(run_id, file_id)` acquisition, in row order.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: GroupKey,
    pub members: Vec<usize>,
}

/// All groups recorded at one field value.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPartition {
    pub field: f64,
    pub groups: Vec<Group>,
}

impl FieldPartition {
    pub fn track_count(&self) -> usize {
        self.groups.iter().map(|g| g.members.len()).sum()
    }
}

/// Input columns carried through to the output untouched
#[derive(Debug, Clone, Default)]
pub struct Passthrough {
    pub headers: StringRecord,
    pub records: Vec<StringRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct TrackTable {
    tracks: Vec<Track>,
    passthrough: Option<Passthrough>,
}

impl TrackTable {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            passthrough: None,
        }
    }

    pub fn with_passthrough(tracks: Vec<Track>, passthrough: Passthrough) -> Self {
        Self {
            tracks,
            passthrough: Some(passthrough),
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn passthrough(&self) -> Option<&Passthrough> {
        self.passthrough.as_ref()
    }

    /// Distinct field values, ascending
    pub fn distinct_fields(&self) -> Vec<f64> {
        self.partition().into_iter().map(|p| p.field).collect()
    }

    /// Split the table by field, then by `(run_id, file_id)`.
    ///
    /// Fields and groups come out ascending; members keep row order.
    pub fn partition(&self) -> Vec<FieldPartition> {
        let mut fields: BTreeMap<OrderedFloat<f64>, BTreeMap<GroupKey, Vec<usize>>> = BTreeMap::new();

        for (index, track) in self.tracks.iter().enumerate() {
            fields
                .entry(OrderedFloat(track.field))
                .or_default()
                .entry(track.group_key())
                .or_default()
                .push(index);
        }

        fields
            .into_iter()
            .map(|(field, groups)| FieldPartition {
                field: field.0,
                groups: groups
                    .into_iter()
                    .map(|(key, members)| Group { key, members })
                    .collect(),
            })
            .collect()
    }

    /// Copy out the tracks of one group, in member order
    pub fn group_tracks(&self, members: &[usize]) -> Vec<Track> {
        members.iter().map(|&i| self.tracks[i].clone()).collect()
    }

    /// Store classification results for one group. Measured values are
    /// never overwritten.
    pub fn write_back(&mut self, members: &[usize], classified: &[Track]) {
        for (&index, result) in members.iter().zip(classified) {
            let track = &mut self.tracks[index];
            track.band = result.band;
            track.group_id = result.group_id;
            track.axial_frequency = result.axial_frequency;
        }
    }

    pub fn summary(&self) -> ClassificationSummary {
        ClassificationSummary::from_tracks(&self.tracks)
    }
}
