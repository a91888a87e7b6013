//! Sentence construction
//!
//! Wraps a decoded value with the label and unit of the signal it came from
//! and renders it in the configured output format.

use crate::config::RecordFormat;
use crate::registry::{SignalRegistry, SignalSpec};
use crate::types::{DecodedRecord, DecoderError, Result};

/// Builds output records from registry metadata
pub struct SentenceBuilder<'a> {
    registry: &'a SignalRegistry,
}

impl<'a> SentenceBuilder<'a> {
    /// Create a builder over a registry
    pub fn new(registry: &'a SignalRegistry) -> Self {
        Self { registry }
    }

    /// Build the record for `identifier`, or `None` if it is not registered
    pub fn build(&self, identifier: &str, timestamp: &str, value: f64) -> Option<DecodedRecord> {
        self.registry
            .lookup(identifier)
            .map(|spec| build_record(spec, timestamp, value))
    }
}

/// Build a record from an already matched spec
pub fn build_record(spec: &SignalSpec, timestamp: &str, value: f64) -> DecodedRecord {
    DecodedRecord {
        timestamp: timestamp.to_string(),
        label: spec.label.clone(),
        value,
        unit: spec.unit.clone(),
    }
}

/// Render one record as an output line, including the terminator
pub fn render(record: &DecodedRecord, format: RecordFormat) -> Result<String> {
    let mut line = match format {
        RecordFormat::Sentence => record.to_sentence(),
        RecordFormat::Json => serde_json::to_string(record)
            .map_err(|e| DecoderError::InvalidData(format!("cannot serialize record: {}", e)))?,
    };
    line.push('\n');
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_known_identifiers() {
        let registry = SignalRegistry::builtin();
        let builder = SentenceBuilder::new(&registry);

        let rpm = builder.build("0CF004F0", "1468514638.123456", 33.0).unwrap();
        assert_eq!(rpm.to_sentence(), "1468514638.123456,RPM,33.0,r/min");

        let fuel = builder.build("0CFEF2F0", "1468514638.2", 2.0).unwrap();
        assert_eq!(fuel.to_sentence(), "1468514638.2,Consumption,2.0,l/h");
    }

    #[test]
    fn test_unknown_identifier_suppressed() {
        let registry = SignalRegistry::builtin();
        let builder = SentenceBuilder::new(&registry);
        assert!(builder.build("18FEEE00", "1.0", 1.0).is_none());
    }

    #[test]
    fn test_render_sentence() {
        let spec = SignalSpec::new("0CF004F0", 3, 4, 8.0, "RPM", "r/min");
        let record = build_record(&spec, "1.5", 2.125);
        assert_eq!(
            render(&record, RecordFormat::Sentence).unwrap(),
            "1.5,RPM,2.125,r/min\n"
        );
    }

    #[test]
    fn test_render_json() {
        let spec = SignalSpec::new("0CFEF2F0", 0, 1, 20.0, "Consumption", "l/h");
        let record = build_record(&spec, "1.5", 2.0);
        let line = render(&record, RecordFormat::Json).unwrap();
        assert!(line.ends_with('\n'));

        let parsed: DecodedRecord = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(parsed, record);
    }
}
