//! optitrade - command line entry point
//!
//! Loads a price series, runs the pair finder and reports the pairs found.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use optitrade::backtest::{load_series, scan_series, PenaltySweep, PriceSeries, ScanResult};
use optitrade::config::Config;
use optitrade::finder::Penalty;
use std::f64::consts::PI;
use tracing::{info, warn, Level};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// optitrade CLI
#[derive(Parser)]
#[command(name = "optitrade")]
#[command(version, about = "Penalty-aware opt-in/opt-out pair finder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a series file for opt-in/opt-out pairs
    Scan {
        /// Path to CSV or JSON series file (defaults to data.path from config)
        #[arg(short, long)]
        data: Option<String>,

        /// Value column in headered CSV files
        #[arg(long)]
        column: Option<String>,

        /// First day to scan (YYYY-MM-DD), stamped series only
        #[arg(long)]
        start: Option<String>,

        /// Last day to scan (YYYY-MM-DD), inclusive
        #[arg(long)]
        end: Option<String>,

        /// Symmetric penalty applied on entry and exit
        #[arg(short, long)]
        penalty: Option<f64>,

        /// Penalty applied on entry only
        #[arg(long)]
        entry_penalty: Option<f64>,

        /// Penalty applied on exit only
        #[arg(long)]
        exit_penalty: Option<f64>,

        /// Print pairs as JSON
        #[arg(long)]
        json: bool,

        /// Output directory for pairs.csv
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Scan one series under several symmetric penalties
    Sweep {
        /// Path to CSV or JSON series file (defaults to data.path from config)
        #[arg(short, long)]
        data: Option<String>,

        /// Value column in headered CSV files
        #[arg(long)]
        column: Option<String>,

        /// First day to scan (YYYY-MM-DD), stamped series only
        #[arg(long)]
        start: Option<String>,

        /// Last day to scan (YYYY-MM-DD), inclusive
        #[arg(long)]
        end: Option<String>,

        /// Comma-separated penalties, e.g. 0.001,0.0025,0.005
        #[arg(long, value_delimiter = ',')]
        penalties: Option<Vec<f64>>,

        /// Number of worker threads
        #[arg(short = 'j', long)]
        parallelism: Option<usize>,

        /// Output directory for sweep.csv
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Run the built-in sample series
    Demo {
        /// Symmetric penalty applied on entry and exit
        #[arg(short, long, default_value = "0.0025")]
        penalty: f64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging()?;

    let mut config = Config::load()?;

    match cli.command {
        Commands::Scan {
            data,
            column,
            start,
            end,
            penalty,
            entry_penalty,
            exit_penalty,
            json,
            output,
        } => {
            if let Some(p) = penalty {
                config.penalty.entry = p;
                config.penalty.exit = p;
            }
            if let Some(p) = entry_penalty {
                config.penalty.entry = p;
            }
            if let Some(p) = exit_penalty {
                config.penalty.exit = p;
            }
            apply_data_overrides(&mut config, data, column, start, end);
            config.output.json |= json;
            if output.is_some() {
                config.output.directory = output;
            }
            config.validate()?;

            run_scan(&config)
        }
        Commands::Sweep {
            data,
            column,
            start,
            end,
            penalties,
            parallelism,
            output,
        } => {
            apply_data_overrides(&mut config, data, column, start, end);
            if let Some(penalties) = penalties {
                config.sweep.penalties = penalties;
            }
            if let Some(parallelism) = parallelism {
                config.sweep.parallelism = parallelism;
            }
            if output.is_some() {
                config.output.directory = output;
            }
            config.validate()?;

            run_sweep(&config)
        }
        Commands::Demo { penalty } => run_demo(penalty),
    }
}

fn apply_data_overrides(
    config: &mut Config,
    data: Option<String>,
    column: Option<String>,
    start: Option<String>,
    end: Option<String>,
) {
    if data.is_some() {
        config.data.path = data;
    }
    if let Some(column) = column {
        config.data.value_column = column;
    }
    if start.is_some() {
        config.data.start = start;
    }
    if end.is_some() {
        config.data.end = end;
    }
}

/// Initialize logging to stderr and a rolling file under `logs/`.
///
/// Stdout is kept for results so JSON output stays machine-readable.
fn init_logging() -> Result<()> {
    use tracing_subscriber::fmt::writer::MakeWriterExt;

    std::fs::create_dir_all("logs")?;

    let file_appender = tracing_appender::rolling::daily("logs", "optitrade.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // Keep the writer alive for the program duration
    Box::leak(Box::new(guard));

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("optitrade=info".parse()?)
                .add_directive(Level::WARN.into()),
        )
        .with_writer(std::io::stderr.and(file_writer))
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(false)
        .init();

    Ok(())
}

fn load_configured_series(config: &Config) -> Result<PriceSeries> {
    let path = config
        .data
        .path
        .as_deref()
        .context("No series file given (use --data or set data.path)")?;

    info!("📊 Loading series from: {}", path);
    let mut series = load_series(path, &config.data.value_column)?;

    if let Some((start, end)) = config.data.date_range()? {
        if series.timestamps.is_none() {
            warn!("Series has no timestamps, ignoring date range");
        }
        series = series.between(start, end);
        anyhow::ensure!(!series.is_empty(), "No samples within the requested date range");
    }

    info!("   Samples: {}", series.len());
    if let Some((start, end)) = series.available_range() {
        info!("   Range: {} to {}", start.to_rfc3339(), end.to_rfc3339());
    }

    Ok(series)
}

fn run_scan(config: &Config) -> Result<()> {
    let series = load_configured_series(config)?;
    let penalty = config.penalty()?;

    info!(
        "💰 Penalty: entry {:.4}% / exit {:.4}%",
        penalty.entry() * 100.0,
        penalty.exit() * 100.0
    );

    let result = scan_series(&series, penalty)?;
    print_result(&result, config.output.json)?;

    if let Some(dir) = &config.output.directory {
        std::fs::create_dir_all(dir)?;
        let path = format!("{}/pairs.csv", dir);
        result.report.to_csv(&path)?;
        info!("📁 Pairs saved to: {}", path);
    }

    Ok(())
}

fn run_sweep(config: &Config) -> Result<()> {
    let series = load_configured_series(config)?;
    let penalties = config.sweep_penalties()?;

    let results = PenaltySweep::new(penalties, config.sweep.parallelism).run(&series)?;
    println!("\n{}", results.summary());

    if let Some(dir) = &config.output.directory {
        std::fs::create_dir_all(dir)?;
        let path = format!("{}/sweep.csv", dir);
        results.to_csv(&path)?;
        info!("📁 Sweep results saved to: {}", path);
    }

    Ok(())
}

fn run_demo(penalty: f64) -> Result<()> {
    let penalty = Penalty::symmetric(penalty)?;

    let samples = [
        (
            "short sample",
            PriceSeries::new(vec![5.94, 5.89, 5.97, 6.0, 5.98, 6.07, 5.88, 5.98, 5.9]),
        ),
        ("cosine wave", PriceSeries::new(cosine_wave(100))),
    ];

    for (name, series) in &samples {
        info!("▶ Demo series: {} ({} samples)", name, series.len());
        let result = scan_series(series, penalty)?;
        print_result(&result, false)?;
    }

    Ok(())
}

fn print_result(result: &ScanResult, json: bool) -> Result<()> {
    if json {
        let pairs: Vec<(usize, usize)> = result.pairs.iter().map(|p| p.as_tuple()).collect();
        println!("{}", serde_json::to_string_pretty(&pairs)?);
    } else {
        println!("\n{}", result.report.summary());
    }
    Ok(())
}

/// One period of `5 + cos(t)` with a small deterministic wobble.
fn cosine_wave(len: usize) -> Vec<f64> {
    let step = if len > 1 {
        2.0 * PI / (len - 1) as f64
    } else {
        0.0
    };

    (0..len)
        .map(|i| {
            let t = i as f64 * step;
            let wobble = 0.08 * (i as f64 * 12.9898).sin() * (i as f64 * 4.1414).cos();
            5.0 + t.cos() + wobble
        })
        .collect()
}
