//! Signal registry
//!
//! Maps frame identifiers to the parameters needed to decode one physical
//! value from their payload. Adding a signal means adding a row here; the
//! value decoder and sentence builder never branch on identifiers.

use crate::frame_parser::IDENTIFIER_LEN;
use crate::types::{DecoderError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Decode parameters for one identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSpec {
    /// 8-character hexadecimal identifier
    pub identifier: String,
    /// Payload index of the low byte
    pub low_byte: usize,
    /// Payload index of the high byte
    pub high_byte: usize,
    /// Divisor turning the raw 16-bit reading into a physical value
    pub scaling_factor: f64,
    /// Output signal name
    pub label: String,
    /// Output unit
    pub unit: String,
}

impl SignalSpec {
    /// Create a new signal spec
    pub fn new(
        identifier: impl Into<String>,
        low_byte: usize,
        high_byte: usize,
        scaling_factor: f64,
        label: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            low_byte,
            high_byte,
            scaling_factor,
            label: label.into(),
            unit: unit.into(),
        }
    }

    /// Highest payload index this signal reads
    pub fn max_byte_index(&self) -> usize {
        self.low_byte.max(self.high_byte)
    }

    /// Check the invariants every registry entry must hold
    pub fn validate(&self) -> Result<()> {
        if self.identifier.len() != IDENTIFIER_LEN
            || !self.identifier.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(DecoderError::InvalidSignalDefinition(format!(
                "identifier {:?} must be {} hex characters",
                self.identifier, IDENTIFIER_LEN
            )));
        }
        if self.low_byte == self.high_byte {
            return Err(DecoderError::InvalidSignalDefinition(format!(
                "{}: low and high byte both at index {}",
                self.identifier, self.low_byte
            )));
        }
        if !(self.scaling_factor.is_finite() && self.scaling_factor > 0.0) {
            return Err(DecoderError::InvalidSignalDefinition(format!(
                "{}: scaling factor must be positive, got {}",
                self.identifier, self.scaling_factor
            )));
        }
        for (field, text) in [("label", &self.label), ("unit", &self.unit)] {
            if text.is_empty() || text.contains([',', '\n', '\r']) {
                return Err(DecoderError::InvalidSignalDefinition(format!(
                    "{}: {} {:?} must be non-empty and free of commas and line breaks",
                    self.identifier, field, text
                )));
            }
        }
        Ok(())
    }
}

/// The identifier-keyed signal table
#[derive(Debug, Clone, Default)]
pub struct SignalRegistry {
    specs: HashMap<String, SignalSpec>,
}

impl SignalRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the engine speed and fuel consumption signals
    pub fn builtin() -> Self {
        let mut specs = HashMap::new();
        for spec in builtin_specs() {
            specs.insert(spec.identifier.clone(), spec);
        }
        Self { specs }
    }

    /// Add a signal after validating it
    ///
    /// Identifiers must be unique; registering one twice is an error.
    pub fn insert(&mut self, spec: SignalSpec) -> Result<()> {
        spec.validate()?;
        if self.specs.contains_key(&spec.identifier) {
            return Err(DecoderError::InvalidSignalDefinition(format!(
                "duplicate identifier {}",
                spec.identifier
            )));
        }
        log::debug!(
            "Registered signal {} ({}) for identifier {}",
            spec.label,
            spec.unit,
            spec.identifier
        );
        self.specs.insert(spec.identifier.clone(), spec);
        Ok(())
    }

    /// Builder method: add several signals
    pub fn with_specs(mut self, specs: impl IntoIterator<Item = SignalSpec>) -> Result<Self> {
        for spec in specs {
            self.insert(spec)?;
        }
        Ok(self)
    }

    /// Look up the spec for an identifier (case-sensitive)
    pub fn lookup(&self, identifier: &str) -> Option<&SignalSpec> {
        self.specs.get(identifier)
    }

    /// Number of registered signals
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// True if no signals are registered
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// All specs ordered by identifier
    pub fn specs(&self) -> Vec<&SignalSpec> {
        let mut specs: Vec<&SignalSpec> = self.specs.values().collect();
        specs.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        specs
    }
}

fn builtin_specs() -> [SignalSpec; 2] {
    [
        SignalSpec::new("0CF004F0", 3, 4, 8.0, "RPM", "r/min"),
        SignalSpec::new("0CFEF2F0", 0, 1, 20.0, "Consumption", "l/h"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table() {
        let registry = SignalRegistry::builtin();
        assert_eq!(registry.len(), 2);

        let rpm = registry.lookup("0CF004F0").unwrap();
        assert_eq!((rpm.low_byte, rpm.high_byte), (3, 4));
        assert_eq!(rpm.scaling_factor, 8.0);
        assert_eq!(rpm.label, "RPM");
        assert_eq!(rpm.unit, "r/min");

        let fuel = registry.lookup("0CFEF2F0").unwrap();
        assert_eq!((fuel.low_byte, fuel.high_byte), (0, 1));
        assert_eq!(fuel.scaling_factor, 20.0);
        assert_eq!(fuel.label, "Consumption");
        assert_eq!(fuel.unit, "l/h");
    }

    #[test]
    fn test_builtin_specs_are_valid() {
        for spec in builtin_specs() {
            spec.validate().unwrap();
        }
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let registry = SignalRegistry::builtin();
        assert!(registry.lookup("0cf004f0").is_none());
        assert!(registry.lookup("18FEEE00").is_none());
    }

    #[test]
    fn test_insert_additional_signal() {
        let registry = SignalRegistry::builtin()
            .with_specs([SignalSpec::new("18FEEE00", 0, 1, 1.0, "Coolant", "degC")])
            .unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.lookup("18FEEE00").unwrap().label, "Coolant");

        let ids: Vec<&str> = registry.specs().iter().map(|s| s.identifier.as_str()).collect();
        assert_eq!(ids, vec!["0CF004F0", "0CFEF2F0", "18FEEE00"]);
    }

    #[test]
    fn test_duplicate_identifier_rejected() {
        let mut registry = SignalRegistry::builtin();
        let err = registry
            .insert(SignalSpec::new("0CF004F0", 0, 1, 1.0, "Other", "x"))
            .unwrap_err();
        assert!(matches!(err, DecoderError::InvalidSignalDefinition(_)));
    }

    #[test]
    fn test_invalid_specs_rejected() {
        let invalid = [
            SignalSpec::new("0CF004F", 0, 1, 1.0, "Short", "x"),
            SignalSpec::new("0CF004FG", 0, 1, 1.0, "NotHex", "x"),
            SignalSpec::new("0CF004F1", 2, 2, 1.0, "SameByte", "x"),
            SignalSpec::new("0CF004F2", 0, 1, 0.0, "ZeroScale", "x"),
            SignalSpec::new("0CF004F3", 0, 1, -4.0, "Negative", "x"),
            SignalSpec::new("0CF004F4", 0, 1, f64::NAN, "NaN", "x"),
            SignalSpec::new("0CF004F5", 0, 1, 1.0, "Bad,Label", "x"),
            SignalSpec::new("0CF004F6", 0, 1, 1.0, "Label", ""),
        ];
        let mut registry = SignalRegistry::new();
        for spec in invalid {
            assert!(registry.insert(spec).is_err());
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_max_byte_index() {
        assert_eq!(SignalSpec::new("0CF004F0", 3, 4, 8.0, "RPM", "r/min").max_byte_index(), 4);
        assert_eq!(SignalSpec::new("0CF004F0", 6, 2, 8.0, "RPM", "r/min").max_byte_index(), 6);
    }
}
