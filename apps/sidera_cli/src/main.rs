use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use sidera::{ChartEngine, ChartInput, EngineSettings};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about = "Chart relationships from ecliptic positions")]
struct Args {
    /// Engine config (default: configs/engine.toml, then built-in defaults).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aspects, shape, lunar phase and Part of Fortune of one chart.
    Natal {
        /// Chart JSON: moment, positions, optional location/houses/is_day.
        input: PathBuf,
    },
    /// Progress a chart to a target date.
    Progressed {
        input: PathBuf,
        /// Target moment, RFC 3339 (e.g. 2030-01-01T00:00:00Z).
        #[arg(long)]
        target: DateTime<Utc>,
    },
    /// Composite of two charts.
    Composite { a: PathBuf, b: PathBuf },
}

/// Explicit config, else `configs/engine.toml` under `base`, else the
/// built-in defaults. A config that exists but is broken is an error.
fn load_settings(config: Option<&Path>, base: &Path) -> anyhow::Result<EngineSettings> {
    if let Some(path) = config {
        return sidera_config::load_engine_settings_from(path);
    }
    match sidera_config::load_engine_settings_in(base)? {
        Some(settings) => Ok(settings),
        None => {
            log::warn!(
                "No engine.toml at {:?}; using built-in engine defaults",
                sidera_config::ENGINE_TOML_PATHS
            );
            Ok(EngineSettings::default())
        }
    }
}

fn read_chart(path: &Path) -> anyhow::Result<ChartInput> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read chart {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse chart JSON {}", path.display()))
}

fn run(args: &Args) -> anyhow::Result<String> {
    let settings = load_settings(args.config.as_deref(), Path::new("."))?;
    let engine = ChartEngine::new(settings)?;

    let report = match &args.command {
        Command::Natal { input } => {
            let chart = read_chart(input)?;
            serde_json::to_string_pretty(&engine.natal(&chart)?)?
        }
        Command::Progressed { input, target } => {
            let chart = read_chart(input)?;
            // No ephemeris ships with the CLI; daily houses reports that clearly
            let progressed = engine.progressed(&chart, *target, None)?;
            serde_json::to_string_pretty(&progressed)?
        }
        Command::Composite { a, b } => {
            let chart_a = read_chart(a)?;
            let chart_b = read_chart(b)?;
            serde_json::to_string_pretty(&engine.composite(&chart_a, &chart_b)?)?
        }
    };
    Ok(report)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let report = run(&args)?;
    println!("{}", report);
    Ok(())
}
