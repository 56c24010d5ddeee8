// src/histogram.rs
//
// Per-field axial frequency distributions over a fixed display domain.
// Reads classified CSV output; rendering is left to external tools.

use crate::error::{ClassifyError, Result};
use crate::io::AXIAL_FREQUENCY_COLUMN;
use crate::types::{BandType, HistogramConfig};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use tracing::info;

#[derive(Debug, Deserialize)]
struct ClassifiedRow {
    set_field: f64,
    #[serde(rename = "Band_type", default)]
    band_code: Option<i8>,
    #[serde(rename = "Axial_Frequency")]
    axial_frequency: f64,
}

#[derive(Debug, Serialize)]
struct BinRow {
    field: f64,
    bin_start_hz: f64,
    bin_end_hz: f64,
    count: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldHistogram {
    pub field: f64,
    pub min_hz: f64,
    pub max_hz: f64,
    pub counts: Vec<u64>,
    /// Values outside `[min_hz, max_hz]`, lone tracks included
    pub outside: u64,
}

impl FieldHistogram {
    fn new(field: f64, config: &HistogramConfig) -> Self {
        Self {
            field,
            min_hz: config.min_hz,
            max_hz: config.max_hz,
            counts: vec![0; config.bins],
            outside: 0,
        }
    }

    pub fn bin_width(&self) -> f64 {
        (self.max_hz - self.min_hz) / self.counts.len() as f64
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Count `value`; the upper domain edge belongs to the last bin
    pub fn add(&mut self, value: f64) {
        if !(value >= self.min_hz && value <= self.max_hz) {
            self.outside += 1;
            return;
        }
        let bin = ((value - self.min_hz) / self.bin_width()) as usize;
        let last = self.counts.len() - 1;
        self.counts[bin.min(last)] += 1;
    }
}

fn validate(config: &HistogramConfig) -> Result<()> {
    if config.bins == 0 {
        return Err(ClassifyError::config("histogram.bins must be at least 1"));
    }
    if !(config.min_hz < config.max_hz) {
        return Err(ClassifyError::config(format!(
            "histogram domain must satisfy min_hz < max_hz, got {}..{}",
            config.min_hz, config.max_hz
        )));
    }
    Ok(())
}

/// Bin `(field, axial_frequency)` samples, one histogram per field,
/// fields ascending.
pub fn build_histograms(
    samples: impl IntoIterator<Item = (f64, f64)>,
    config: &HistogramConfig,
) -> Result<Vec<FieldHistogram>> {
    validate(config)?;

    let mut histograms: BTreeMap<OrderedFloat<f64>, FieldHistogram> = BTreeMap::new();
    for (field, value) in samples {
        histograms
            .entry(OrderedFloat(field))
            .or_insert_with(|| FieldHistogram::new(field, config))
            .add(value);
    }
    Ok(histograms.into_values().collect())
}

/// Read classified tracks and bin their axial frequencies
pub fn histograms_from_csv<R: Read>(reader: R, config: &HistogramConfig) -> Result<Vec<FieldHistogram>> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?.clone();
    if !headers.iter().any(|h| h == AXIAL_FREQUENCY_COLUMN) {
        return Err(ClassifyError::data(
            0,
            format!("no {} column; classify the file first", AXIAL_FREQUENCY_COLUMN),
        ));
    }

    let mut samples = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let parsed: ClassifiedRow = record
            .deserialize(Some(&headers))
            .map_err(|e| ClassifyError::data(row, e.to_string()))?;
        if let Some(code) = parsed.band_code {
            if BandType::from_code(code).is_none() {
                return Err(ClassifyError::data(row, format!("unknown band type {}", code)));
            }
        }
        samples.push((parsed.set_field, parsed.axial_frequency));
    }

    let histograms = build_histograms(samples, config)?;
    for histogram in &histograms {
        info!(
            "Field {} T: {} track(s) in domain, {} outside",
            histogram.field,
            histogram.total(),
            histogram.outside
        );
    }
    Ok(histograms)
}

/// `field,bin_start_hz,bin_end_hz,count`, one row per bin
pub fn write_histograms<W: Write>(histograms: &[FieldHistogram], writer: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for histogram in histograms {
        let width = histogram.bin_width();
        for (i, &count) in histogram.counts.iter().enumerate() {
            let bin_start_hz = histogram.min_hz + width * i as f64;
            writer.serialize(BinRow {
                field: histogram.field,
                bin_start_hz,
                bin_end_hz: bin_start_hz + width,
                count,
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}
