// End-to-end decoding of candump logs into sink files
use candump_decoder::{read_series_file, Decoder, DecoderConfig, SinkMode};
use std::fs;
use std::path::Path;

const LOG: &str = "\
(1468514638.000100) can0 0CF004F0#FFFFFF0801FFFFFF
(1468514638.010200) can0 18FEF100#FFFFFFFFFFFFFFFF
(1468514638.020300) can0 0CFEF2F0#2800FFFFFFFFFFFF
(1468514638.030400) can0
(1468514638.040500) can0 0CF004F0#FFFFFF11
(1468514638.050600) can0 0CF004F0#FFFFFF1100FFFFFF
(1468514638.060700) can0 0CFEF2F0#3300FFFFFFFFFFFF
";

const EXPECTED: &str = "\
1468514638.000100,RPM,33.0,r/min
1468514638.020300,Consumption,2.0,l/h
1468514638.050600,RPM,2.125,r/min
1468514638.060700,Consumption,2.55,l/h
";

fn write_log(dir: &Path) -> std::path::PathBuf {
    let _ = env_logger::builder().is_test(true).try_init();
    let path = dir.join("candump.log");
    fs::write(&path, LOG).unwrap();
    path
}

#[test]
fn decodes_log_file_into_sentences() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path());
    let sink = dir.path().join("CANData.txt");

    let stats = Decoder::new().decode_file(&log, &sink).unwrap();

    assert_eq!(fs::read_to_string(&sink).unwrap(), EXPECTED);
    assert_eq!(stats.lines_read, 7);
    assert_eq!(stats.records_written, 4);
    assert_eq!(stats.unknown_identifiers, 1);
    assert_eq!(stats.malformed_lines, 1);
    assert_eq!(stats.decode_failures, 1);
}

#[test]
fn append_mode_accumulates_runs() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path());
    let sink = dir.path().join("CANData.txt");

    let decoder = Decoder::new();
    decoder.decode_file(&log, &sink).unwrap();
    decoder.decode_file(&log, &sink).unwrap();

    assert_eq!(fs::read_to_string(&sink).unwrap(), EXPECTED.repeat(2));
}

#[test]
fn truncate_mode_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path());
    let sink = dir.path().join("CANData.txt");
    fs::write(&sink, "stale content\n").unwrap();

    let decoder =
        Decoder::new().with_config(DecoderConfig::new().with_sink_mode(SinkMode::Truncate));

    decoder.decode_file(&log, &sink).unwrap();
    let first = fs::read(&sink).unwrap();
    decoder.decode_file(&log, &sink).unwrap();
    let second = fs::read(&sink).unwrap();

    assert_eq!(first, second);
    assert_eq!(String::from_utf8(first).unwrap(), EXPECTED);
}

#[test]
fn missing_log_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = Decoder::new().decode_file(
        &dir.path().join("does-not-exist.log"),
        &dir.path().join("out.txt"),
    );
    assert!(result.is_err());
}

#[test]
fn decoded_sink_feeds_series() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path());
    let sink = dir.path().join("CANData.txt");
    Decoder::new().decode_file(&log, &sink).unwrap();

    let series = read_series_file(&sink).unwrap();
    assert_eq!(series.len(), 2);

    let rpm = &series[0];
    assert_eq!(rpm.label, "RPM");
    assert_eq!(rpm.points.len(), 2);
    assert_eq!(rpm.points[0], (0.0, 33.0));
    assert!((rpm.points[1].0 - 0.0505).abs() < 1e-6);
    assert_eq!(rpm.points[1].1, 2.125);

    let fuel = &series[1];
    assert_eq!(fuel.label, "Consumption");
    assert_eq!(fuel.unit, "l/h");
    assert_eq!(fuel.points.iter().map(|p| p.1).collect::<Vec<_>>(), vec![2.0, 2.55]);
}
