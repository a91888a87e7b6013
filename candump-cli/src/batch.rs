//! Parallel batch decoding
//!
//! Decodes lines in fixed-size chunks on a rayon pool and hands the outcomes
//! to the stream driver in input order, so the sink content is identical to a
//! sequential run. Memory use is bounded by one chunk.

use anyhow::{Context, Result};
use candump_decoder::{
    open_sink, Decoder, LineOutcome, LineReader, RecordSink, RunStats, StreamDriver,
};
use rayon::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Lines decoded per parallel chunk
pub const CHUNK_LINES: usize = 4096;

/// Decode `log_path` into `sink_path` using `jobs` worker threads
pub fn decode_file_parallel(
    decoder: &Decoder,
    log_path: &Path,
    sink_path: &Path,
    jobs: usize,
) -> Result<RunStats> {
    log::info!(
        "Decoding log file with {} workers: {:?} -> {:?}",
        jobs,
        log_path,
        sink_path
    );

    let source = BufReader::new(
        File::open(log_path).with_context(|| format!("Failed to open log file: {:?}", log_path))?,
    );
    let sink = open_sink(sink_path, decoder.config().sink_mode)
        .with_context(|| format!("Failed to open output file: {:?}", sink_path))?;
    decode_parallel(decoder, source, sink, jobs)
}

/// Decode `source` into `sink` using `jobs` worker threads
pub fn decode_parallel<R: BufRead, W: Write>(
    decoder: &Decoder,
    source: R,
    sink: W,
    jobs: usize,
) -> Result<RunStats> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .context("Failed to start worker pool")?;

    let mut driver = StreamDriver::new(RecordSink::new(sink, decoder.config().format));
    let mut lines = LineReader::new(source);

    loop {
        let chunk: Vec<_> = lines.by_ref().take(CHUNK_LINES).collect();
        if chunk.is_empty() {
            break;
        }

        let outcomes: Vec<(usize, candump_decoder::Result<LineOutcome>)> = pool.install(|| {
            chunk
                .into_par_iter()
                .map(|(line_number, line)| {
                    (line_number, line.and_then(|text| decoder.classify_line(&text)))
                })
                .collect()
        });

        for (line_number, outcome) in outcomes {
            driver.handle(line_number, outcome)?;
        }
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
