//! candump Decoder Library
//!
//! A small, reusable library for turning SocketCAN `candump -l` logs into a
//! stream of telemetry records, one physical value per matched frame.
//!
//! # Architecture
//!
//! Each log line passes through a fixed pipeline:
//! - [`frame_parser`] splits the line into timestamp, identifier and payload tokens
//! - [`SignalRegistry`] maps the identifier to byte positions, divisor, label and unit
//! - [`ValueDecoder`] combines the low/high byte and applies the divisor
//! - [`sentence`] wraps the value into a [`DecodedRecord`]
//! - [`driver`] appends each record to the sink and flushes it
//!
//! Frames with identifiers that are not registered are dropped silently.
//! Malformed lines and payloads too short for their signal are logged and
//! skipped; only output failures abort a run.
//!
//! # Example Usage
//!
//! ```no_run
//! use candump_decoder::{Decoder, DecoderConfig, SinkMode};
//! use std::path::Path;
//!
//! let decoder = Decoder::new()
//!     .with_config(DecoderConfig::new().with_sink_mode(SinkMode::Truncate));
//!
//! let stats = decoder
//!     .decode_file(Path::new("candump.log"), Path::new("CANData.txt"))
//!     .unwrap();
//! println!("{} records written", stats.records_written);
//! ```

// Public modules
pub mod config;
pub mod decoder;
pub mod driver;
pub mod frame_parser;
pub mod registry;
pub mod sentence;
pub mod series;
pub mod types;
pub mod value_decoder;

// Re-export main types for convenience
pub use config::{DecoderConfig, RecordFormat, SinkMode};
pub use decoder::Decoder;
pub use driver::{open_sink, LineOutcome, RecordSink, RunStats, StreamDriver};
pub use frame_parser::{parse_line, LineReader};
pub use registry::{SignalRegistry, SignalSpec};
pub use sentence::SentenceBuilder;
pub use series::{read_series, read_series_file, Series};
pub use types::{DecodedRecord, DecoderError, ParsedFrame, Result, Timestamp};
pub use value_decoder::ValueDecoder;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: ensure we can create a decoder
        let decoder = Decoder::new();
        assert_eq!(decoder.registry().len(), 2);
        assert!(!VERSION.is_empty());
    }
}
