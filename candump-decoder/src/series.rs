//! Time series from a persisted sink
//!
//! Reads decoded records back from a sink file and groups them by label into
//! `(elapsed seconds, value)` series for charting. Both record formats are
//! accepted and may be mixed; rows that do not parse are skipped.

use crate::frame_parser::LineReader;
use crate::types::{parse_seconds, DecodedRecord, DecoderError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One signal over time
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Signal label
    pub label: String,
    /// Unit of the first sample
    pub unit: String,
    /// `(seconds since the first sample of this label, value)` pairs in sink order
    pub points: Vec<(f64, f64)>,
}

impl Series {
    fn new(label: &str, unit: &str) -> Self {
        Self {
            label: label.to_string(),
            unit: unit.to_string(),
            points: Vec::new(),
        }
    }

    /// Smallest and largest value, if any
    pub fn value_range(&self) -> Option<(f64, f64)> {
        min_max(self.points.iter().map(|&(_, v)| v))
    }

    /// Smallest and largest elapsed time, if any
    pub fn time_range(&self) -> Option<(f64, f64)> {
        min_max(self.points.iter().map(|&(t, _)| t))
    }

    /// Find the series with `label` in a set
    pub fn for_label<'a>(series: &'a [Series], label: &str) -> Option<&'a Series> {
        series.iter().find(|s| s.label == label)
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Parse one sink row in either format
///
/// Rows with a non-finite value are rejected.
pub fn parse_record(line: &str) -> Result<DecodedRecord> {
    let record = parse_row(line.trim())?;
    if !record.value.is_finite() {
        return Err(DecoderError::InvalidData(format!(
            "value {} is not finite",
            record.value
        )));
    }
    Ok(record)
}

fn parse_row(line: &str) -> Result<DecodedRecord> {
    if line.starts_with('{') {
        return serde_json::from_str(line)
            .map_err(|e| DecoderError::InvalidData(format!("bad JSON record: {}", e)));
    }

    let fields: Vec<&str> = line.split(',').collect();
    let [timestamp, label, value, unit] = fields.as_slice() else {
        return Err(DecoderError::InvalidData(format!(
            "expected 4 comma-separated fields in {:?}",
            line
        )));
    };
    let value = value
        .parse::<f64>()
        .map_err(|e| DecoderError::InvalidData(format!("bad value {:?}: {}", value, e)))?;

    Ok(DecodedRecord {
        timestamp: timestamp.to_string(),
        label: label.to_string(),
        value,
        unit: unit.to_string(),
    })
}

/// Group all records from `reader` into per-label series
///
/// Series are returned in order of each label's first appearance.
pub fn read_series<R: BufRead>(reader: R) -> Result<Vec<Series>> {
    let mut series: Vec<Series> = Vec::new();
    // Per series: timestamp of its first sample
    let mut origins: Vec<f64> = Vec::new();

    for (line_number, line) in LineReader::new(reader) {
        let line = match line {
            Ok(line) => line,
            Err(e) if e.is_line_error() => {
                log::warn!("Sink line {}: skipped: {}", line_number, e);
                continue;
            }
            Err(e) => return Err(e),
        };
        if line.trim().is_empty() {
            continue;
        }

        let record = match parse_record(&line) {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Sink line {}: skipped: {}", line_number, e);
                continue;
            }
        };
        let Some(seconds) = parse_seconds(&record.timestamp) else {
            log::warn!(
                "Sink line {}: skipped: timestamp {:?} is not a number",
                line_number,
                record.timestamp
            );
            continue;
        };

        let index = match series.iter().position(|s| s.label == record.label) {
            Some(index) => index,
            None => {
                series.push(Series::new(&record.label, &record.unit));
                origins.push(seconds);
                series.len() - 1
            }
        };
        series[index].points.push((seconds - origins[index], record.value));
    }

    log::debug!("Read {} series from sink", series.len());
    Ok(series)
}

/// Read all series from a sink file
pub fn read_series_file(path: &Path) -> Result<Vec<Series>> {
    log::info!("Reading decoded records from {:?}", path);
    read_series(BufReader::new(File::open(path)?))
}
