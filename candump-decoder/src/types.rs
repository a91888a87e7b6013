//! Core types for the candump decoder library
//!
//! This module defines the values flowing through the decode pipeline: the
//! borrowed view over one parsed log line, the decoded record written to the
//! sink, and the error type shared by every stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Absolute capture time of a frame
pub type Timestamp = DateTime<Utc>;

/// One candump log line split into its positional fields
///
/// All fields borrow from the source line, so a `ParsedFrame` never outlives
/// the line it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFrame<'a> {
    /// Timestamp with the surrounding brackets removed, kept verbatim
    pub timestamp: &'a str,
    /// CAN interface name (e.g. "can0", "vcan1")
    pub interface: &'a str,
    /// 8-character hexadecimal identifier, matched case-sensitively
    pub identifier: &'a str,
    /// Payload as 2-character hex tokens in log order
    pub data_field: Vec<&'a str>,
}

/// Parse a verbatim timestamp as seconds, if it is a finite decimal number
pub fn parse_seconds(timestamp: &str) -> Option<f64> {
    timestamp.parse::<f64>().ok().filter(|s| s.is_finite())
}

/// Convert fractional epoch seconds to a UTC timestamp
pub fn seconds_to_timestamp(seconds: f64) -> Option<Timestamp> {
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    let secs = seconds.trunc() as i64;
    let nsecs = ((seconds - seconds.trunc()) * 1_000_000_000.0).round() as u32;
    DateTime::from_timestamp(secs, nsecs.min(999_999_999))
}

/// One decoded measurement, the unit of output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedRecord {
    /// Timestamp exactly as it appeared in the log
    pub timestamp: String,
    /// Signal label from the registry (e.g. "RPM")
    pub label: String,
    /// Scaled physical value
    pub value: f64,
    /// Engineering unit from the registry (e.g. "r/min")
    pub unit: String,
}

impl DecodedRecord {
    /// Render the comma-separated sentence form (without line terminator)
    pub fn to_sentence(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DecodedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.timestamp,
            self.label,
            format_value(self.value),
            self.unit
        )
    }
}

/// Print a value as a real number without truncating its precision
///
/// Whole numbers keep a trailing `.0` so the column always reads as real.
pub fn format_value(value: f64) -> String {
    // Debug output is the shortest representation that round-trips
    format!("{:?}", value)
}

/// Errors that can occur during decoding
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Malformed line: {0}")]
    MalformedLine(String),

    #[error("Byte index {index} out of range for data field of length {len}")]
    OutOfRangeByteIndex { index: usize, len: usize },

    #[error("Invalid data byte {0:?}")]
    InvalidByte(String),

    #[error("Invalid signal definition: {0}")]
    InvalidSignalDefinition(String),

    #[error("Failed to write to output sink: {0}")]
    SinkWriteFailure(#[source] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DecoderError {
    /// True for failures confined to a single input line
    ///
    /// The stream driver skips these and keeps going; anything else aborts the run.
    pub fn is_line_error(&self) -> bool {
        matches!(
            self,
            DecoderError::MalformedLine(_)
                | DecoderError::OutOfRangeByteIndex { .. }
                | DecoderError::InvalidByte(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sentence() {
        let record = DecodedRecord {
            timestamp: "1468514638.123456".to_string(),
            label: "RPM".to_string(),
            value: 33.0,
            unit: "r/min".to_string(),
        };
        assert_eq!(record.to_sentence(), "1468514638.123456,RPM,33.0,r/min");
    }

    #[test]
    fn test_format_value_keeps_fraction() {
        assert_eq!(format_value(33.0), "33.0");
        assert_eq!(format_value(2.0), "2.0");
        assert_eq!(format_value(2.125), "2.125");
        assert_eq!(format_value(0.05), "0.05");
        assert_eq!(format_value(8191.875), "8191.875");
    }

    #[test]
    fn test_format_value_exponent_form() {
        assert_eq!(format_value(0.0001), "0.0001");
        assert_eq!(format_value(0.00001), "1e-5");
        assert_eq!(format_value(1e16), "1e16");
    }

    #[test]
    fn test_timestamp_conversions() {
        let seconds = parse_seconds("1468514638.500000").unwrap();
        assert_eq!(seconds, 1468514638.5);

        let time = seconds_to_timestamp(seconds).unwrap();
        assert_eq!(time.timestamp(), 1468514638);
        assert_eq!(time.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_non_numeric_timestamp() {
        assert_eq!(parse_seconds("not-a-time"), None);
        assert_eq!(parse_seconds("inf"), None);
        assert_eq!(parse_seconds("NaN"), None);
        assert!(seconds_to_timestamp(-1.0).is_none());
    }

    #[test]
    fn test_line_error_classification() {
        assert!(DecoderError::MalformedLine("x".into()).is_line_error());
        assert!(DecoderError::OutOfRangeByteIndex { index: 4, len: 2 }.is_line_error());
        assert!(DecoderError::InvalidByte("zz".into()).is_line_error());

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert!(!DecoderError::SinkWriteFailure(io).is_line_error());
    }
}
