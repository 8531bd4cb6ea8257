//! Rep Sensing Engine
//!
//! Command-line front end for replaying recorded motion sessions through the
//! rep counter. For library use, see lib.rs.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;

use rep_sensing::{DebouncePolicy, MotionSample, RepCounter, RepCounterConfig};

#[derive(Parser, Debug)]
#[command(name = "rep-sensing", version, about = "Lateral-raise rep counter")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a CSV recording: timestamp_ms,rotation_y,gravity_x,gravity_y,gravity_z
    Replay {
        /// Recording to replay
        input: PathBuf,

        /// JSON configuration file (defaults apply to missing fields)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Use raw fixed-threshold detection
        #[arg(long)]
        raw: bool,

        /// Release the latch as soon as the condition drops
        #[arg(long)]
        release_immediately: bool,
    },
    /// Print the default configuration as JSON
    Defaults {
        /// Print the raw-mode preset instead
        #[arg(long)]
        raw: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rep_sensing=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Replay {
            input,
            config,
            raw,
            release_immediately,
        } => replay(input, config, raw, release_immediately),
        Command::Defaults { raw } => {
            let config = if raw {
                RepCounterConfig::raw()
            } else {
                RepCounterConfig::default()
            };
            println!("{}", config.to_json()?);
            Ok(())
        }
    }
}

fn replay(
    input: PathBuf,
    config_path: Option<PathBuf>,
    raw: bool,
    release_immediately: bool,
) -> anyhow::Result<()> {
    let mut config = match config_path {
        Some(path) => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            RepCounterConfig::from_json(&text)?
        }
        None if raw => RepCounterConfig::raw(),
        None => RepCounterConfig::default(),
    };
    if release_immediately {
        config.debounce_policy = DebouncePolicy::ReleaseImmediately;
    }

    let text = fs::read_to_string(&input)
        .with_context(|| format!("reading recording {}", input.display()))?;
    let samples = parse_csv(&text)?;
    info!(samples = samples.len(), file = %input.display(), "replaying recording");

    let mut counter = RepCounter::new(config)?;
    let mut rejected = 0usize;
    for sample in &samples {
        match counter.ingest(sample) {
            Ok(Some(event)) => println!("rep {} at {}ms", event.count, event.timestamp_ms),
            Ok(None) => {}
            Err(e) if e.is_rejected_sample() => rejected += 1,
            Err(e) => return Err(e.into()),
        }
    }

    println!("total reps: {}", counter.count());
    if rejected > 0 {
        println!("rejected samples: {rejected}");
    }
    Ok(())
}

/// Parse `timestamp_ms,rotation_y,gravity_x,gravity_y,gravity_z` rows.
///
/// Blank lines, `#` comments and a non-numeric header row are skipped.
fn parse_csv(text: &str) -> anyhow::Result<Vec<MotionSample>> {
    let mut samples = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 5 {
            bail!("line {}: expected 5 fields, got {}", lineno + 1, fields.len());
        }
        let timestamp_ms = match fields[0].parse::<u64>() {
            Ok(t) => t,
            Err(_) if lineno == 0 => continue,
            Err(e) => bail!("line {}: bad timestamp: {}", lineno + 1, e),
        };
        let mut values = [0.0f64; 4];
        for (slot, field) in values.iter_mut().zip(&fields[1..]) {
            *slot = field
                .parse()
                .with_context(|| format!("line {}: bad value {:?}", lineno + 1, field))?;
        }
        samples.push(MotionSample::new(
            timestamp_ms,
            values[0],
            [values[1], values[2], values[3]],
        ));
    }
    Ok(samples)
}
