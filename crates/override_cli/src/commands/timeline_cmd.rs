//! Timeline commands for the override-timeline CLI.
//!
//! - `day`: segments of one setting on one date
//! - `forecast`: segments of one setting over consecutive dates
//! - `grid`: the effective value sampled at a fixed step over consecutive dates
//!
//! # Examples
//!
//! ```bash
//! override-timeline day --setting thermostat --date 2024-03-05
//! override-timeline forecast --setting thermostat --days 7 --format json
//! override-timeline grid --setting thermostat --step 180
//! ```

use chrono::NaiveDate;
use clap::Args;
use colored::{ColoredString, Colorize};
use override_engine::{
    format_minute, sample_grid, DayTimeline, GridRow, RuleSet, RuleVariant, Segment,
};
use tracing::{debug, warn};

use crate::commands::args::{parse_date, to_json, OutputFormat};
use crate::config::DisplayConfig;
use crate::errors::Error;

#[cfg(test)]
#[path = "timeline_cmd_tests.rs"]
mod tests;

/// Arguments of the `day` command.
#[derive(Args, Debug, Clone)]
pub struct DayArgs {
    /// Setting to resolve.
    #[arg(long)]
    pub setting: String,

    /// Date to resolve (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Arguments of the `forecast` command.
#[derive(Args, Debug, Clone)]
pub struct ForecastArgs {
    /// Setting to resolve.
    #[arg(long)]
    pub setting: String,

    /// First date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub start: Option<NaiveDate>,

    /// Number of dates. Defaults to the configured forecast length.
    #[arg(long)]
    pub days: Option<u32>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Arguments of the `grid` command.
#[derive(Args, Debug, Clone)]
pub struct GridArgs {
    /// Setting to resolve.
    #[arg(long)]
    pub setting: String,

    /// First date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub start: Option<NaiveDate>,

    /// Number of dates. Defaults to the configured forecast length.
    #[arg(long)]
    pub days: Option<u32>,

    /// Minutes between samples. Defaults to the configured grid step.
    #[arg(long)]
    pub step: Option<u16>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Renders the segments of one setting on one date.
pub fn day(snapshot: &RuleSet, args: &DayArgs, today: NaiveDate) -> Result<String, Error> {
    let date = args.date.unwrap_or(today);
    warn_if_unknown(snapshot, &args.setting);
    debug!(setting = %args.setting, %date, "Resolving day");

    let timeline = snapshot.day_timeline(&args.setting, date);
    match args.format {
        OutputFormat::Json => to_json(&timeline),
        OutputFormat::Text => Ok(render_timeline(&args.setting, &timeline)),
    }
}

/// Renders the segments of one setting over consecutive dates.
pub fn forecast(
    snapshot: &RuleSet,
    display: &DisplayConfig,
    args: &ForecastArgs,
    today: NaiveDate,
) -> Result<String, Error> {
    let start = args.start.unwrap_or(today);
    let days = args.days.unwrap_or(display.forecast_days);
    warn_if_unknown(snapshot, &args.setting);

    let timelines = snapshot.forecast(&args.setting, start, days)?;
    match args.format {
        OutputFormat::Json => to_json(&timelines),
        OutputFormat::Text => Ok(timelines
            .iter()
            .map(|timeline| render_timeline(&args.setting, timeline))
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// Renders the sampled grid of one setting.
pub fn grid(
    snapshot: &RuleSet,
    display: &DisplayConfig,
    args: &GridArgs,
    today: NaiveDate,
) -> Result<String, Error> {
    let start = args.start.unwrap_or(today);
    let days = args.days.unwrap_or(display.forecast_days);
    let step = args.step.unwrap_or(display.grid_step_minutes);
    warn_if_unknown(snapshot, &args.setting);

    let rows = sample_grid(&args.setting, snapshot.rules(), start, days, step)?;
    match args.format {
        OutputFormat::Json => to_json(&rows),
        OutputFormat::Text => Ok(render_grid(&rows)),
    }
}

fn warn_if_unknown(snapshot: &RuleSet, setting: &str) {
    if !snapshot.rules().iter().any(|rule| rule.setting_name == setting) {
        warn!(setting, "No rules reference this setting");
    }
}

/// Text view of one day: a header line and one line per segment.
pub fn render_timeline(setting: &str, timeline: &DayTimeline) -> String {
    let mut out = format!(
        "{} on {} ({})\n",
        setting.bold(),
        timeline.date.format("%Y-%m-%d"),
        timeline.date.format("%a")
    );

    if timeline.segments.is_empty() {
        out.push_str("  (no overrides)\n");
        return out;
    }

    let value_width = timeline
        .segments
        .iter()
        .map(|segment| segment.value.len())
        .max()
        .unwrap_or(0);
    for segment in &timeline.segments {
        out.push_str(&render_segment(segment, value_width));
        out.push('\n');
    }
    out
}

fn render_segment(segment: &Segment, value_width: usize) -> String {
    format!(
        "  {}-{}  {}  {}  #{} {}",
        format_minute(usize::from(segment.start_minute)),
        format_minute(usize::from(segment.end_minute)),
        format!("{:<width$}", segment.value, width = value_width).bold(),
        paint_variant(segment.variant),
        segment.rule_index,
        segment.metadata.describe()
    )
}

/// Variant name padded to a fixed column and colored by class.
pub fn paint_variant(variant: RuleVariant) -> ColoredString {
    let label = format!("{:<11}", variant.to_string());
    match variant {
        RuleVariant::TimeRange => label.yellow(),
        RuleVariant::Scheduled => label.cyan(),
        RuleVariant::Conditional => label.magenta(),
        RuleVariant::Standard => label.normal(),
    }
}

/// Text view of a grid: a header of sample times, one row per date.
pub fn render_grid(rows: &[GridRow]) -> String {
    let Some(first) = rows.first() else {
        return String::new();
    };

    let cell_width = rows
        .iter()
        .flat_map(|row| row.samples.iter())
        .filter_map(|(_, resolution)| resolution.as_ref().map(|r| r.value.len()))
        .max()
        .unwrap_or(0)
        .max(5);

    let mut out = format!("{:<10}", "");
    for (minute, _) in &first.samples {
        out.push_str(&format!(
            " {:>width$}",
            format_minute(usize::from(*minute)),
            width = cell_width
        ));
    }
    out.push('\n');

    for row in rows {
        out.push_str(&row.date.format("%Y-%m-%d").to_string());
        for (_, resolution) in &row.samples {
            let cell = resolution.as_ref().map_or("-", |r| r.value.as_str());
            out.push_str(&format!(" {:>width$}", cell, width = cell_width));
        }
        out.push('\n');
    }
    out
}
