// src/io.rs
//
// CSV persistence for track tables.
//
// Input rows must carry the measured columns below; every other column is
// passed through to the output, which appends Band_type, Beta and
// Axial_Frequency.

use crate::dataset::{Passthrough, TrackTable};
use crate::error::{ClassifyError, Result};
use crate::geometry::Point;
use crate::types::Track;
use csv::StringRecord;
use serde::Deserialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const BAND_TYPE_COLUMN: &str = "Band_type";
pub const GROUP_ID_COLUMN: &str = "Beta";
pub const AXIAL_FREQUENCY_COLUMN: &str = "Axial_Frequency";

const OUTPUT_SUFFIX: &str = "_with_sidebands";

#[derive(Debug, Deserialize)]
struct TrackRow {
    set_field: f64,
    run_id: f64,
    file_id: f64,
    #[serde(rename = "EventStartTime")]
    start_time: f64,
    #[serde(rename = "EventEndTime")]
    end_time: f64,
    #[serde(rename = "EventStartFreq")]
    start_freq: f64,
    #[serde(rename = "EventEndFreq")]
    end_freq: f64,
    #[serde(rename = "EventSlope")]
    slope: f64,
}

impl TrackRow {
    fn into_track(self, row: usize) -> Result<Track> {
        let values = [
            ("set_field", self.set_field),
            ("EventStartTime", self.start_time),
            ("EventEndTime", self.end_time),
            ("EventStartFreq", self.start_freq),
            ("EventEndFreq", self.end_freq),
            ("EventSlope", self.slope),
        ];
        if let Some((name, value)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ClassifyError::data(row, format!("{} is not finite: {}", name, value)));
        }

        Ok(Track::new(
            self.set_field,
            whole_id(row, "run_id", self.run_id)?,
            whole_id(row, "file_id", self.file_id)?,
            Point::new(self.start_time, self.start_freq),
            Point::new(self.end_time, self.end_freq),
            self.slope,
        ))
    }
}

/// Ids may be stored as `4` or `4.0`; anything fractional is rejected
fn whole_id(row: usize, name: &str, value: f64) -> Result<i64> {
    if !value.is_finite() || value.fract() != 0.0 || value.abs() > i64::MAX as f64 {
        return Err(ClassifyError::data(
            row,
            format!("{} must be a whole number, got {}", name, value),
        ));
    }
    Ok(value as i64)
}

fn is_classification_column(name: &str) -> bool {
    matches!(
        name,
        BAND_TYPE_COLUMN | GROUP_ID_COLUMN | AXIAL_FREQUENCY_COLUMN
    )
}

/// Read a track table. Any malformed row fails the whole load.
pub fn read_tracks<R: Read>(reader: R) -> Result<TrackTable> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?.clone();

    // Columns from an earlier classification run are recomputed, not kept
    let keep: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, name)| !is_classification_column(name))
        .map(|(i, _)| i)
        .collect();
    let kept_headers: StringRecord = keep.iter().map(|&i| &headers[i]).collect();

    let mut tracks = Vec::new();
    let mut records = Vec::new();

    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let parsed: TrackRow = record
            .deserialize(Some(&headers))
            .map_err(|e| ClassifyError::data(row, e.to_string()))?;
        tracks.push(parsed.into_track(row)?);
        records.push(keep.iter().map(|&i| &record[i]).collect::<StringRecord>());
    }

    debug!("Read {} track(s), {} column(s)", tracks.len(), kept_headers.len());
    Ok(TrackTable::with_passthrough(
        tracks,
        Passthrough {
            headers: kept_headers,
            records,
        },
    ))
}

pub fn read_tracks_from_path(path: &Path) -> Result<TrackTable> {
    let file = File::open(path)?;
    let table = read_tracks(file)?;
    info!("Loaded {} track(s) from {}", table.len(), path.display());
    Ok(table)
}

/// Write the table with the three classification columns appended.
///
/// Tables built without passthrough columns are written with the measured
/// columns only.
pub fn write_tracks<W: Write>(table: &TrackTable, writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);

    match table.passthrough() {
        Some(passthrough) => {
            let mut headers = passthrough.headers.clone();
            append_classification_headers(&mut headers);
            writer.write_record(&headers)?;

            for (record, track) in passthrough.records.iter().zip(table.tracks()) {
                let mut record = record.clone();
                append_classification(&mut record, track);
                writer.write_record(&record)?;
            }
        }
        None => {
            let mut headers: StringRecord = [
                "set_field",
                "run_id",
                "file_id",
                "EventStartTime",
                "EventEndTime",
                "EventStartFreq",
                "EventEndFreq",
                "EventSlope",
            ]
            .into_iter()
            .collect();
            append_classification_headers(&mut headers);
            writer.write_record(&headers)?;

            for track in table.tracks() {
                let mut record: StringRecord = [
                    track.field,
                    track.run_id as f64,
                    track.file_id as f64,
                    track.start_time,
                    track.end_time,
                    track.start_freq,
                    track.end_freq,
                    track.slope,
                ]
                .iter()
                .map(|v| v.to_string())
                .collect();
                append_classification(&mut record, track);
                writer.write_record(&record)?;
            }
        }
    }

    writer.flush()?;
    Ok(())
}

pub fn write_tracks_to_path(table: &TrackTable, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_tracks(table, file)?;
    info!("Wrote {} track(s) to {}", table.len(), path.display());
    Ok(())
}

fn append_classification_headers(headers: &mut StringRecord) {
    headers.push_field(BAND_TYPE_COLUMN);
    headers.push_field(GROUP_ID_COLUMN);
    headers.push_field(AXIAL_FREQUENCY_COLUMN);
}

fn append_classification(record: &mut StringRecord, track: &Track) {
    record.push_field(&track.band.code().to_string());
    record.push_field(&track.group_id.unwrap_or(0).to_string());
    record.push_field(&track.axial_frequency.to_string());
}

/// `dir/name.csv` → `dir/name_with_sidebands.csv`
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{}{}.{}", stem, OUTPUT_SUFFIX, ext.to_string_lossy()),
        None => format!("{}{}", stem, OUTPUT_SUFFIX),
    };
    input.with_file_name(name)
}
