//! candump decoder CLI
//!
//! Command-line front end for the candump-decoder library:
//! - `decode`: turn a candump log into telemetry sentences
//! - `plot`: render decoded signals as PDF charts
//! - `signals`: show the signal table in effect

use anyhow::{bail, Context, Result};
use candump_decoder::{
    read_series_file, Decoder, DecoderConfig, RecordFormat, RunStats, Series, SinkMode,
};
use chrono::SecondsFormat;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

mod batch;
mod chart;
mod config;

use config::AppConfig;

/// candump decoder - decode engine telemetry from CAN logs
#[derive(Parser, Debug)]
#[command(name = "candump-cli")]
#[command(about = "Decode candump logs into telemetry records and plot them", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a candump log into the output file
    Decode(DecodeArgs),
    /// Render decoded signals as PDF charts
    Plot(PlotArgs),
    /// List the registered signals
    Signals,
}

#[derive(ClapArgs, Debug)]
struct DecodeArgs {
    /// candump log file to decode
    #[arg(short, long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Output file for decoded records (default: CANData.txt)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Clear the output file before writing instead of appending
    #[arg(long)]
    truncate: bool,

    /// Output record format
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Only decode this identifier (can be repeated)
    #[arg(long = "id", value_name = "ID")]
    identifiers: Vec<String>,

    /// Worker threads; more than 1 decodes in parallel chunks
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,
}

#[derive(ClapArgs, Debug)]
struct PlotArgs {
    /// Decoded record file (default: the decode output file)
    #[arg(short, long, value_name = "FILE")]
    data: Option<PathBuf>,

    /// Directory for the PDF charts (default: current directory)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Only draw charts for this label (can be repeated)
    #[arg(long = "label", value_name = "LABEL")]
    labels: Vec<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Sentence,
    Json,
}

impl From<FormatArg> for RecordFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Sentence => RecordFormat::Sentence,
            FormatArg::Json => RecordFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("candump decoder CLI v{}", env!("CARGO_PKG_VERSION"));
    log::debug!("Using decoder library v{}", candump_decoder::VERSION);

    let app_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    match &args.command {
        Command::Decode(decode_args) => decode_mode(decode_args, &app_config, args.quiet),
        Command::Plot(plot_args) => plot_mode(plot_args, &app_config, args.quiet),
        Command::Signals => signals_mode(&app_config),
    }
}

/// Decode mode - stream the log into the sink and print a summary
fn decode_mode(args: &DecodeArgs, app_config: &AppConfig, quiet: bool) -> Result<()> {
    let Some(log_path) = args.log.clone().or_else(|| app_config.input.log.clone()) else {
        bail!("No log file given; pass --log <FILE> or set [input] log in the config");
    };
    let sink_path = args.output.clone().unwrap_or_else(|| app_config.sink_path());

    let mut decoder_config = DecoderConfig::new()
        .with_sink_mode(if args.truncate {
            SinkMode::Truncate
        } else {
            app_config.output.mode
        })
        .with_format(args.format.map(RecordFormat::from).unwrap_or(app_config.output.format));
    if !args.identifiers.is_empty() {
        decoder_config = decoder_config.with_identifier_filter(args.identifiers.clone());
    } else if let Some(identifiers) = &app_config.output.identifiers {
        decoder_config = decoder_config.with_identifier_filter(identifiers.clone());
    }

    let decoder = Decoder::with_registry(app_config.registry()?).with_config(decoder_config);

    let stats = if args.jobs > 1 {
        batch::decode_file_parallel(&decoder, &log_path, &sink_path, args.jobs)?
    } else {
        decoder
            .decode_file(&log_path, &sink_path)
            .with_context(|| format!("Failed to decode {:?} into {:?}", log_path, sink_path))?
    };

    if !quiet {
        print_summary(&log_path, &sink_path, &stats);
    }
    Ok(())
}

fn print_summary(log_path: &Path, sink_path: &Path, stats: &RunStats) {
    println!("═══════════════════════════════════════════════");
    println!("  candump decoder - Summary");
    println!("═══════════════════════════════════════════════");
    println!("  Log:                 {}", log_path.display());
    println!("  Output:              {}", sink_path.display());
    println!("  Lines read:          {}", stats.lines_read);
    println!("  Records written:     {}", stats.records_written);
    println!("  Unknown identifiers: {}", stats.unknown_identifiers);
    if stats.filtered_frames > 0 {
        println!("  Filtered frames:     {}", stats.filtered_frames);
    }
    println!("  Malformed lines:     {}", stats.malformed_lines);
    println!("  Decode failures:     {}", stats.decode_failures);
    if let Some((first, last)) = stats.capture_span() {
        println!(
            "  Capture span:        {} .. {} ({:.3} s)",
            first.to_rfc3339_opts(SecondsFormat::Millis, true),
            last.to_rfc3339_opts(SecondsFormat::Millis, true),
            (last - first).num_milliseconds() as f64 / 1000.0
        );
    }
}

/// Plot mode - read decoded records and render one PDF per chart
fn plot_mode(args: &PlotArgs, app_config: &AppConfig, quiet: bool) -> Result<()> {
    let data_path = args
        .data
        .clone()
        .or_else(|| app_config.plot.data.clone())
        .unwrap_or_else(|| app_config.sink_path());
    let output_dir = args
        .output_dir
        .clone()
        .or_else(|| app_config.plot.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    let series = read_series_file(&data_path)
        .with_context(|| format!("Failed to read decoded records from {:?}", data_path))?;
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

    let charts: Vec<_> = app_config
        .charts()
        .into_iter()
        .filter(|chart| args.labels.is_empty() || args.labels.contains(&chart.label))
        .collect();
    if charts.is_empty() {
        bail!("No chart configured for the requested label(s)");
    }

    let mut rendered = 0;
    for chart in &charts {
        let Some(signal) = Series::for_label(&series, &chart.label) else {
            log::warn!("No records labelled {:?} in {:?}", chart.label, data_path);
            continue;
        };
        let path = output_dir.join(&chart.file);
        match chart::render_pdf(signal, chart, &path) {
            Ok(()) => {
                rendered += 1;
                if !quiet {
                    println!("✓ {} -> {}", chart.label, path.display());
                }
            }
            Err(e) => log::error!("Chart {:?} not rendered: {}", chart.label, e),
        }
    }

    if rendered == 0 {
        bail!("No charts rendered from {:?}", data_path);
    }
    Ok(())
}

/// Signals mode - print the effective registry
fn signals_mode(app_config: &AppConfig) -> Result<()> {
    let registry = app_config.registry()?;
    println!(
        "{:<10} {:>4} {:>4} {:>8}  {:<16} {}",
        "ID", "LOW", "HIGH", "SCALE", "LABEL", "UNIT"
    );
    for spec in registry.specs() {
        println!(
            "{:<10} {:>4} {:>4} {:>8}  {:<16} {}",
            spec.identifier,
            spec.low_byte,
            spec.high_byte,
            spec.scaling_factor,
            spec.label,
            spec.unit
        );
    }
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
