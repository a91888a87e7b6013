//! Decoder configuration types
//!
//! This module defines the small set of knobs the decoder library needs: how
//! the output sink is opened, how records are rendered, and an optional
//! identifier filter. Signal definitions live in the registry, not here.

use serde::{Deserialize, Serialize};

/// How the output sink is opened at the start of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkMode {
    /// Keep existing content and add new records at the end
    #[default]
    Append,
    /// Discard existing content before writing
    Truncate,
}

/// Text form of each record written to the sink
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordFormat {
    /// `timestamp,label,value,unit`
    #[default]
    Sentence,
    /// One JSON object per line
    #[serde(alias = "jsonlines")]
    Json,
}

/// Configuration for the decoder library
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Whether the sink is appended to or truncated
    #[serde(default)]
    pub sink_mode: SinkMode,

    /// Output record format
    #[serde(default)]
    pub format: RecordFormat,

    /// Optional: only decode these identifiers (must also be in the registry)
    #[serde(default)]
    pub identifier_filter: Option<Vec<String>>,
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set sink open mode
    pub fn with_sink_mode(mut self, mode: SinkMode) -> Self {
        self.sink_mode = mode;
        self
    }

    /// Builder method: set output record format
    pub fn with_format(mut self, format: RecordFormat) -> Self {
        self.format = format;
        self
    }

    /// Builder method: set identifier filter
    pub fn with_identifier_filter(mut self, identifiers: Vec<String>) -> Self {
        self.identifier_filter = Some(identifiers);
        self
    }

    /// Check if an identifier should be processed
    pub fn should_process_identifier(&self, identifier: &str) -> bool {
        match &self.identifier_filter {
            Some(identifiers) => identifiers.iter().any(|id| id == identifier),
            None => true,
        }
    }
}
