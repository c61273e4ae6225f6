//! Trace-driven cache simulator CLI.
//!
//! This binary provides two entry points. It performs:
//! 1. **Run:** Parse a text trace, replay it through the configured cache with the
//!    standard statistics sinks and print a JSON summary.
//! 2. **Geometry:** Validate a cache configuration and print its derived bit widths.

mod report;
mod trace;

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cachereplay_core::config::ReplayMode;
use cachereplay_core::events::EventLog;
use cachereplay_core::stats::{HitMissStats, SiuStats, UsageStats};
use cachereplay_core::{Config, EventSink, ReplayController};

use crate::report::{GeometrySummary, Summary};

#[derive(Parser, Debug)]
#[command(
    name = "cachereplay",
    author,
    version,
    about = "Deterministic trace-driven cache simulator",
    long_about = "Replay a memory-access trace through a set-associative LRU cache.\n\nTrace lines are `time thread kind size addr`.\n\nExamples:\n  cachereplay run trace.txt\n  cachereplay run trace.txt --cache-size 8192 --ways 4 --mode two\n  cachereplay geometry --config l1.json"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a trace and print a JSON summary.
    Run {
        /// Trace file to replay.
        trace: PathBuf,

        #[command(flatten)]
        cache: CacheArgs,

        /// Number of passes; `auto` makes two only when a sink needs lookahead.
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Write every event of the retained pass to this file as JSON lines.
        #[arg(long)]
        events: Option<PathBuf>,
    },

    /// Print the derived cache geometry as JSON.
    Geometry {
        #[command(flatten)]
        cache: CacheArgs,
    },
}

/// Cache configuration: an optional JSON file plus per-field overrides.
#[derive(Args, Debug, Default)]
struct CacheArgs {
    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address width in bits.
    #[arg(long)]
    arch_bits: Option<u32>,

    /// Total capacity in bytes.
    #[arg(long)]
    cache_size: Option<u64>,

    /// Line size in bytes.
    #[arg(long)]
    line_size: Option<u32>,

    /// Associativity.
    #[arg(long)]
    ways: Option<u32>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Auto,
    Single,
    Two,
}

impl From<ModeArg> for ReplayMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Auto => Self::Auto,
            ModeArg::Single => Self::SinglePass,
            ModeArg::Two => Self::TwoPass,
        }
    }
}

impl CacheArgs {
    /// Builds the effective configuration and validates its geometry.
    fn load(&self, mode: Option<ModeArg>) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => Config::default(),
        };
        let g = &mut config.geometry;
        if let Some(v) = self.arch_bits {
            g.arch_bits = v;
        }
        if let Some(v) = self.cache_size {
            g.cache_size = v;
        }
        if let Some(v) = self.line_size {
            g.line_size = v;
        }
        if let Some(v) = self.ways {
            g.associativity = v;
        }
        if let Some(mode) = mode {
            config.replay.mode = mode.into();
        }
        config
            .geometry
            .validate()
            .context("invalid cache geometry")?;
        Ok(config)
    }
}

/// Reads a JSON config file. Geometry validation happens after overrides are applied.
fn read_config(path: &Path) -> anyhow::Result<Config> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("unable to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("malformed config {}", path.display()))
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            trace,
            cache,
            mode,
            events,
        } => cmd_run(&trace, &cache, mode, events.as_deref()),
        Commands::Geometry { cache } => {
            let config = cache.load(None)?;
            let summary = GeometrySummary::from(&config.geometry);
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
    }
}

/// Parses `trace_path`, replays it with the standard sinks and prints the summary.
fn cmd_run(
    trace_path: &Path,
    cache: &CacheArgs,
    mode: Option<ModeArg>,
    events: Option<&Path>,
) -> anyhow::Result<()> {
    let config = cache.load(mode)?;

    let file = File::open(trace_path)
        .with_context(|| format!("unable to open trace {}", trace_path.display()))?;
    let records = trace::parse(BufReader::new(file))
        .with_context(|| format!("unable to parse trace {}", trace_path.display()))?;
    info!(records = records.len(), path = %trace_path.display(), "trace loaded");

    let mut hits = HitMissStats::new();
    let mut usage = UsageStats::new();
    let mut siu = SiuStats::new();
    let mut log = EventLog::new();

    let mut controller = ReplayController::from_config(&config)?;
    let report = {
        let mut sinks: Vec<&mut dyn EventSink> = Vec::with_capacity(4);
        sinks.push(&mut hits);
        sinks.push(&mut usage);
        sinks.push(&mut siu);
        if events.is_some() {
            sinks.push(&mut log);
        }
        controller.run(&records, &mut sinks).context("replay failed")?
    };

    if let Some(path) = events {
        report::write_events(path, &log.events)?;
    }

    let summary = Summary::new(
        controller.geometry(),
        config.replay.mode,
        &report,
        &hits,
        &usage,
        &siu,
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
