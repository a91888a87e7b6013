//! Stream driver
//!
//! Carries decode outcomes line by line into the output sink. Every record is
//! flushed before the next line is handled, so an interrupted run loses at
//! most the line in flight. Per-line failures are logged and counted; only
//! sink and source I/O failures end a run.

use crate::config::{RecordFormat, SinkMode};
use crate::sentence::render;
use crate::types::{
    parse_seconds, seconds_to_timestamp, DecodedRecord, DecoderError, Result, Timestamp,
};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// What became of one input line
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// A registered signal was decoded
    Record(DecodedRecord),
    /// Empty or whitespace-only line
    Blank,
    /// Identifier not in the registry
    Unknown,
    /// Identifier excluded by the configured filter
    Filtered,
}

impl LineOutcome {
    /// The decoded record, if any
    pub fn into_record(self) -> Option<DecodedRecord> {
        match self {
            LineOutcome::Record(record) => Some(record),
            _ => None,
        }
    }
}

/// Counters collected over one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub lines_read: usize,
    pub blank_lines: usize,
    pub malformed_lines: usize,
    pub unknown_identifiers: usize,
    pub filtered_frames: usize,
    pub decode_failures: usize,
    pub records_written: usize,
    /// Timestamp (seconds) of the first written record
    pub first_timestamp: Option<f64>,
    /// Timestamp (seconds) of the last written record
    pub last_timestamp: Option<f64>,
}

impl RunStats {
    /// Lines that were dropped because of a per-line error
    pub fn skipped_lines(&self) -> usize {
        self.malformed_lines + self.decode_failures
    }

    /// Capture time of the first and last written record
    pub fn capture_span(&self) -> Option<(Timestamp, Timestamp)> {
        let first = seconds_to_timestamp(self.first_timestamp?)?;
        let last = seconds_to_timestamp(self.last_timestamp?)?;
        Some((first, last))
    }

    fn note_record_time(&mut self, record: &DecodedRecord) {
        if let Some(seconds) = parse_seconds(&record.timestamp) {
            self.first_timestamp.get_or_insert(seconds);
            self.last_timestamp = Some(seconds);
        }
    }
}

/// Output sink writing one flushed line per record
pub struct RecordSink<W: Write> {
    writer: W,
    format: RecordFormat,
}

impl<W: Write> RecordSink<W> {
    /// Wrap a writer
    pub fn new(writer: W, format: RecordFormat) -> Self {
        Self { writer, format }
    }

    /// Append one record and flush it
    pub fn write_record(&mut self, record: &DecodedRecord) -> Result<()> {
        let line = render(record, self.format)?;
        self.writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.flush())
            .map_err(DecoderError::SinkWriteFailure)
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Open the sink file once for a whole run
pub fn open_sink(path: &Path, mode: SinkMode) -> Result<BufWriter<File>> {
    let mut options = OpenOptions::new();
    options.create(true);
    match mode {
        SinkMode::Append => options.append(true),
        SinkMode::Truncate => options.write(true).truncate(true),
    };

    let file = options.open(path).map_err(DecoderError::SinkWriteFailure)?;
    log::debug!("Opened sink {:?} ({:?})", path, mode);
    Ok(BufWriter::new(file))
}

/// Applies line outcomes to a sink in input order
pub struct StreamDriver<W: Write> {
    sink: RecordSink<W>,
    stats: RunStats,
}

impl<W: Write> StreamDriver<W> {
    /// Create a driver writing to `sink`
    pub fn new(sink: RecordSink<W>) -> Self {
        Self {
            sink,
            stats: RunStats::default(),
        }
    }

    /// Handle the outcome of decoding line `line_number`
    ///
    /// Per-line errors are logged and counted; fatal errors are returned.
    pub fn handle(&mut self, line_number: usize, outcome: Result<LineOutcome>) -> Result<()> {
        self.stats.lines_read += 1;

        match outcome {
            Ok(LineOutcome::Record(record)) => {
                self.sink.write_record(&record)?;
                self.stats.records_written += 1;
                self.stats.note_record_time(&record);
            }
            Ok(LineOutcome::Blank) => self.stats.blank_lines += 1,
            Ok(LineOutcome::Unknown) => self.stats.unknown_identifiers += 1,
            Ok(LineOutcome::Filtered) => self.stats.filtered_frames += 1,
            Err(e @ DecoderError::MalformedLine(_)) => {
                log::warn!("Line {}: skipped: {}", line_number, e);
                self.stats.malformed_lines += 1;
            }
            Err(e) if e.is_line_error() => {
                log::warn!("Line {}: cannot decode: {}", line_number, e);
                self.stats.decode_failures += 1;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Counters collected so far
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Finish the run, returning the counters and the sink
    pub fn finish(self) -> (RunStats, W) {
        (self.stats, self.sink.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn record(timestamp: &str, value: f64) -> DecodedRecord {
        DecodedRecord {
            timestamp: timestamp.to_string(),
            label: "RPM".to_string(),
            value,
            unit: "r/min".to_string(),
        }
    }

    /// Writer that fails every write
    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_driver_counts_and_writes() {
        let mut driver = StreamDriver::new(RecordSink::new(Vec::new(), RecordFormat::Sentence));

        driver.handle(1, Ok(LineOutcome::Record(record("10.5", 33.0)))).unwrap();
        driver.handle(2, Ok(LineOutcome::Unknown)).unwrap();
        driver.handle(3, Err(DecoderError::MalformedLine("short".into()))).unwrap();
        driver
            .handle(4, Err(DecoderError::OutOfRangeByteIndex { index: 4, len: 2 }))
            .unwrap();
        driver.handle(5, Ok(LineOutcome::Blank)).unwrap();
        driver.handle(6, Ok(LineOutcome::Filtered)).unwrap();
        driver.handle(7, Ok(LineOutcome::Record(record("12.0", 2.125)))).unwrap();

        let (stats, output) = driver.finish();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "10.5,RPM,33.0,r/min\n12.0,RPM,2.125,r/min\n"
        );
        assert_eq!(stats.lines_read, 7);
        assert_eq!(stats.records_written, 2);
        assert_eq!(stats.unknown_identifiers, 1);
        assert_eq!(stats.malformed_lines, 1);
        assert_eq!(stats.decode_failures, 1);
        assert_eq!(stats.blank_lines, 1);
        assert_eq!(stats.filtered_frames, 1);
        assert_eq!(stats.skipped_lines(), 2);
        assert_eq!(stats.first_timestamp, Some(10.5));
        assert_eq!(stats.last_timestamp, Some(12.0));
    }

    #[test]
    fn test_sink_failure_is_fatal() {
        let mut driver = StreamDriver::new(RecordSink::new(FailingWriter, RecordFormat::Sentence));
        let err = driver
            .handle(1, Ok(LineOutcome::Record(record("1.0", 1.0))))
            .unwrap_err();
        assert!(matches!(err, DecoderError::SinkWriteFailure(_)));
        assert_eq!(driver.stats().records_written, 0);
    }

    #[test]
    fn test_non_line_errors_propagate() {
        let mut driver = StreamDriver::new(RecordSink::new(Vec::new(), RecordFormat::Sentence));
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "gone");
        let err = driver.handle(1, Err(DecoderError::IoError(io_err))).unwrap_err();
        assert!(matches!(err, DecoderError::IoError(_)));
    }

    #[test]
    fn test_capture_span() {
        let stats = RunStats {
            first_timestamp: Some(1468514638.0),
            last_timestamp: Some(1468514698.5),
            ..Default::default()
        };
        let (first, last) = stats.capture_span().unwrap();
        assert_eq!((last - first).num_milliseconds(), 60_500);

        assert!(RunStats::default().capture_span().is_none());
    }

    #[test]
    fn test_capture_span_ignores_unusable_timestamps() {
        let mut driver = StreamDriver::new(RecordSink::new(Vec::new(), RecordFormat::Sentence));
        driver.handle(1, Ok(LineOutcome::Record(record("inf", 1.0)))).unwrap();
        driver.handle(2, Ok(LineOutcome::Record(record("10.0", 1.0)))).unwrap();
        driver.handle(3, Ok(LineOutcome::Record(record("later", 1.0)))).unwrap();
        driver.handle(4, Ok(LineOutcome::Record(record("12.5", 1.0)))).unwrap();

        let stats = driver.stats();
        assert_eq!(stats.records_written, 4);
        assert_eq!(stats.first_timestamp, Some(10.0));
        assert_eq!(stats.last_timestamp, Some(12.5));
    }

    #[test]
    fn test_open_sink_modes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");

        for _ in 0..2 {
            let mut sink = open_sink(&path, SinkMode::Append).unwrap();
            sink.write_all(b"a\n").unwrap();
            sink.flush().unwrap();
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\na\n");

        let mut sink = open_sink(&path, SinkMode::Truncate).unwrap();
        sink.write_all(b"b\n").unwrap();
        sink.flush().unwrap();
        drop(sink);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "b\n");
    }
}
