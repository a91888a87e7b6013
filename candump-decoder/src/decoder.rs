//! Main decoder API
//!
//! This module provides the primary interface for the decoder library.
//! The Decoder struct holds the signal registry and configuration, decodes
//! single lines, and streams whole logs into an output sink.

use crate::config::DecoderConfig;
use crate::driver::{open_sink, LineOutcome, RecordSink, RunStats, StreamDriver};
use crate::frame_parser::{parse_line, LineReader};
use crate::registry::SignalRegistry;
use crate::sentence::SentenceBuilder;
use crate::types::{DecodedRecord, ParsedFrame, Result};
use crate::value_decoder::ValueDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// The main decoder struct - entry point for all decoding operations
///
/// A decoder is immutable once built, so it can be shared across threads and
/// its per-line methods called concurrently.
#[derive(Debug, Clone)]
pub struct Decoder {
    /// Identifier-keyed signal table
    registry: SignalRegistry,
    /// Sink and filter settings
    config: DecoderConfig,
}

impl Decoder {
    /// Create a decoder over the built-in signal table
    pub fn new() -> Self {
        Self::with_registry(SignalRegistry::builtin())
    }

    /// Create a decoder over a custom signal table
    pub fn with_registry(registry: SignalRegistry) -> Self {
        Self {
            registry,
            config: DecoderConfig::default(),
        }
    }

    /// Builder method: replace the configuration
    pub fn with_config(mut self, config: DecoderConfig) -> Self {
        self.config = config;
        self
    }

    /// The signal table in use
    pub fn registry(&self) -> &SignalRegistry {
        &self.registry
    }

    /// The configuration in use
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode one log line
    ///
    /// # Returns
    /// * `Ok(Some(record))` - the line carried a registered signal
    /// * `Ok(None)` - blank line, unknown or filtered identifier
    /// * `Err(_)` - malformed line or payload that does not fit the signal
    ///
    /// # Example
    /// ```
    /// use candump_decoder::Decoder;
    ///
    /// let decoder = Decoder::new();
    /// let record = decoder
    ///     .decode_line("(1468514638.123456) can0 0CF004F0#0000000801000000")
    ///     .unwrap()
    ///     .unwrap();
    /// assert_eq!(record.to_sentence(), "1468514638.123456,RPM,33.0,r/min");
    /// ```
    pub fn decode_line(&self, line: &str) -> Result<Option<DecodedRecord>> {
        self.classify_line(line).map(LineOutcome::into_record)
    }

    /// Decode one log line, keeping the reason a line produced no record
    pub fn classify_line(&self, line: &str) -> Result<LineOutcome> {
        if line.trim().is_empty() {
            return Ok(LineOutcome::Blank);
        }
        let frame = parse_line(line)?;
        self.decode_frame(&frame)
    }

    /// Decode an already parsed frame
    pub fn decode_frame(&self, frame: &ParsedFrame<'_>) -> Result<LineOutcome> {
        if !self.config.should_process_identifier(frame.identifier) {
            log::trace!("Filtered identifier {}", frame.identifier);
            return Ok(LineOutcome::Filtered);
        }

        let Some(spec) = self.registry.lookup(frame.identifier) else {
            log::trace!("Unknown identifier {}, skipping", frame.identifier);
            return Ok(LineOutcome::Unknown);
        };

        let value = ValueDecoder::decode(&frame.data_field, spec)?;
        let record = SentenceBuilder::new(&self.registry).build(
            frame.identifier,
            frame.timestamp,
            value,
        );
        Ok(record.map_or(LineOutcome::Unknown, LineOutcome::Record))
    }

    /// Stream a log from `source` into `sink`
    ///
    /// Reads one line at a time and writes each record before reading the next.
    /// Per-line problems are logged and skipped; a failing sink or source
    /// aborts the run.
    pub fn run<R: BufRead, W: Write>(&self, source: R, sink: W) -> Result<RunStats> {
        let mut driver = StreamDriver::new(RecordSink::new(sink, self.config.format));

        for (line_number, line) in LineReader::new(source) {
            let outcome = line.and_then(|text| self.classify_line(&text));
            driver.handle(line_number, outcome)?;
        }

        let (stats, _) = driver.finish();
        log::info!(
            "Decoded {} records from {} lines ({} skipped, {} unknown identifiers)",
            stats.records_written,
            stats.lines_read,
            stats.skipped_lines(),
            stats.unknown_identifiers
        );
        Ok(stats)
    }

    /// Decode the log at `log_path` into the sink file at `sink_path`
    ///
    /// The sink is opened once, in the configured [`SinkMode`](crate::SinkMode).
    pub fn decode_file(&self, log_path: &Path, sink_path: &Path) -> Result<RunStats> {
        log::info!("Decoding log file: {:?} -> {:?}", log_path, sink_path);

        let source = BufReader::new(File::open(log_path)?);
        let sink = open_sink(sink_path, self.config.sink_mode)?;
        self.run(source, sink)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}
