use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand};
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use override_cli::commands::{
    args::OutputFormat,
    query_cmd::{self, CandidatesArgs, EffectiveArgs, ValueArgs},
    snapshot_cmd,
    timeline_cmd::{self, DayArgs, ForecastArgs, GridArgs},
};
use override_cli::config::{get_config_path, TimelineConfig};
use override_cli::errors::Error;

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

/// override-timeline: Inspect which override rule is in effect, minute by minute
#[derive(Parser)]
#[command(name = "override-timeline")]
#[command(about = "Inspect which override rule is in effect, minute by minute", long_about = None)]
struct Cli {
    /// Path to the rule snapshot (defaults to timeline.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the segments of a setting on one day
    Day(DayArgs),

    /// Show the segments of a setting over consecutive days
    Forecast(ForecastArgs),

    /// Show a setting's value sampled at a fixed step
    Grid(GridArgs),

    /// Show the rule in effect for a setting at one instant
    Value(ValueArgs),

    /// Show the values in effect for every setting at one instant
    Effective(EffectiveArgs),

    /// List windowless conditionals and preview them as active
    Candidates(CandidatesArgs),

    /// Validate the rule snapshot
    Validate {
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show the CLI version
    Version,
}

/// Executes a snapshot command against the configuration at `config_path`.
fn run(cli: &Cli, now: NaiveDateTime) -> Result<String, Error> {
    let config_path = get_config_path(cli.config.as_deref());
    let config = TimelineConfig::load(&config_path)?;

    if let Commands::Validate { format } = &cli.command {
        let summary = snapshot_cmd::validate(&config)?;
        return snapshot_cmd::render_summary(&summary, *format);
    }

    let snapshot = config.snapshot()?;
    debug!(rules = snapshot.len(), "Snapshot ready");
    let today = now.date();

    match &cli.command {
        Commands::Day(args) => timeline_cmd::day(&snapshot, args, today),
        Commands::Forecast(args) => timeline_cmd::forecast(&snapshot, &config.display, args, today),
        Commands::Grid(args) => timeline_cmd::grid(&snapshot, &config.display, args, today),
        Commands::Value(args) => query_cmd::value(&snapshot, args, now),
        Commands::Effective(args) => query_cmd::effective(&snapshot, args, now),
        Commands::Candidates(args) => {
            let report = query_cmd::candidates(&snapshot, args, now)?;
            query_cmd::render_candidates(&report, args.format)
        }
        Commands::Validate { .. } | Commands::Version => Err(Error::InvalidArguments(
            "command does not read a snapshot".to_string(),
        )),
    }
}

fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_env("OVERRIDE_TIMELINE_LOG"))
        .init();

    let cli = Cli::parse();
    if let Commands::Version = cli.command {
        println!(
            "override-timeline version {}",
            option_env!("OVERRIDE_TIMELINE_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
        );
        std::process::exit(0);
    }

    match run(&cli, Local::now().naive_local()) {
        Ok(output) => {
            println!("{}", output.trim_end());
            std::process::exit(0);
        }
        Err(e) => {
            error!("Error: {e}");
            std::process::exit(1);
        }
    }
}
