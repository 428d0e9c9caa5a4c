//! Point query commands for the override-timeline CLI.
//!
//! - `value`: the rule in effect for one setting at one instant
//! - `effective`: the values in effect for every setting at one instant
//! - `candidates`: windowless conditionals awaiting a predicate decision, and
//!   the live day once some of them are marked active

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use clap::Args;
use colored::Colorize;
use override_engine::{
    day_long_candidates, format_minute, resolve_live_day, ConditionalCandidate, Resolution,
    RuleSet, Segment,
};
use serde::Serialize;
use tracing::debug;

use crate::commands::args::{parse_date_time, to_json, OutputFormat};
use crate::commands::timeline_cmd::paint_variant;
use crate::errors::Error;

#[cfg(test)]
#[path = "query_cmd_tests.rs"]
mod tests;

/// Arguments of the `value` command.
#[derive(Args, Debug, Clone)]
pub struct ValueArgs {
    /// Setting to query.
    #[arg(long)]
    pub setting: String,

    /// Local date-time (YYYY-MM-DDTHH:MM). Defaults to now.
    #[arg(long, value_parser = parse_date_time)]
    pub at: Option<NaiveDateTime>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Arguments of the `effective` command.
#[derive(Args, Debug, Clone)]
pub struct EffectiveArgs {
    /// Local date-time (YYYY-MM-DDTHH:MM). Defaults to now.
    #[arg(long, value_parser = parse_date_time)]
    pub at: Option<NaiveDateTime>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Arguments of the `candidates` command.
#[derive(Args, Debug, Clone)]
pub struct CandidatesArgs {
    /// Setting whose conditionals are listed.
    #[arg(long)]
    pub setting: String,

    /// Snapshot index of a candidate whose predicate holds. Repeatable.
    #[arg(long = "active")]
    pub active: Vec<usize>,

    /// Instant of the live view (YYYY-MM-DDTHH:MM). Defaults to now.
    #[arg(long, value_parser = parse_date_time)]
    pub at: Option<NaiveDateTime>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Result of the `candidates` command.
#[derive(Debug, Clone, Serialize)]
pub struct CandidatesReport {
    pub setting: String,
    pub candidates: Vec<ConditionalCandidate>,

    /// Today's segments with the active candidates placed. Only present when
    /// at least one candidate was marked active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_segments: Option<Vec<Segment>>,
}

/// Renders the rule in effect for one setting at one instant.
pub fn value(snapshot: &RuleSet, args: &ValueArgs, now: NaiveDateTime) -> Result<String, Error> {
    let at = args.at.unwrap_or(now);
    let resolution = snapshot.resolver(&args.setting).value_at_time(at);

    match args.format {
        OutputFormat::Json => to_json(&resolution),
        OutputFormat::Text => Ok(match resolution {
            Some(resolution) => format!(
                "{} at {}: {}",
                args.setting.bold(),
                at.format("%Y-%m-%d %H:%M"),
                describe_resolution(&resolution)
            ),
            None => format!(
                "{} at {}: no override in effect",
                args.setting.bold(),
                at.format("%Y-%m-%d %H:%M")
            ),
        }),
    }
}

/// Renders the values in effect for every setting at one instant.
pub fn effective(
    snapshot: &RuleSet,
    args: &EffectiveArgs,
    now: NaiveDateTime,
) -> Result<String, Error> {
    let at = args.at.unwrap_or(now);
    let values: BTreeMap<String, Resolution> = snapshot.effective_values(at);
    debug!(%at, settings = values.len(), "Effective values resolved");

    match args.format {
        OutputFormat::Json => to_json(&values),
        OutputFormat::Text => {
            if values.is_empty() {
                return Ok(format!(
                    "No settings in effect at {}",
                    at.format("%Y-%m-%d %H:%M")
                ));
            }
            let name_width = values.keys().map(String::len).max().unwrap_or(0);
            Ok(values
                .iter()
                .map(|(setting, resolution)| {
                    format!(
                        "{}  {}",
                        format!("{:<width$}", setting, width = name_width).bold(),
                        describe_resolution(resolution)
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }
}

/// Lists the windowless conditionals of a setting and, when some are marked
/// active, the live view of the day at `--at`.
///
/// # Errors
///
/// Returns `Error::InvalidArguments` if an `--active` index does not name a
/// candidate of the setting.
pub fn candidates(
    snapshot: &RuleSet,
    args: &CandidatesArgs,
    now: NaiveDateTime,
) -> Result<CandidatesReport, Error> {
    let candidates = day_long_candidates(&args.setting, snapshot.rules());

    if let Some(unknown) = args
        .active
        .iter()
        .find(|index| !candidates.iter().any(|c| c.rule_index == **index))
    {
        return Err(Error::InvalidArguments(format!(
            "rule {} is not a windowless conditional of '{}'",
            unknown, args.setting
        )));
    }

    let live_segments = if args.active.is_empty() {
        None
    } else {
        let at = args.at.unwrap_or(now);
        let is_active =
            |candidate: &ConditionalCandidate| args.active.contains(&candidate.rule_index);
        Some(resolve_live_day(&args.setting, snapshot.rules(), &is_active, at))
    };

    Ok(CandidatesReport {
        setting: args.setting.clone(),
        candidates,
        live_segments,
    })
}

/// Renders a [`CandidatesReport`].
pub fn render_candidates(report: &CandidatesReport, format: OutputFormat) -> Result<String, Error> {
    if format == OutputFormat::Json {
        return to_json(report);
    }

    let mut out = String::new();
    if report.candidates.is_empty() {
        out.push_str(&format!(
            "{} has no windowless conditionals\n",
            report.setting.bold()
        ));
    } else {
        out.push_str(&format!("{} conditionals:\n", report.setting.bold()));
        for candidate in &report.candidates {
            out.push_str(&format!(
                "  #{}  {} when {} {} {} (priority {})\n",
                candidate.rule_index,
                candidate.value.bold(),
                candidate.source_setting,
                candidate.operator,
                candidate.comparison_value,
                candidate.priority
            ));
        }
    }

    if let Some(segments) = &report.live_segments {
        out.push_str("live:\n");
        for segment in segments {
            out.push_str(&format!(
                "  {}-{}  {}  {}\n",
                format_minute(usize::from(segment.start_minute)),
                format_minute(usize::from(segment.end_minute)),
                segment.value.bold(),
                paint_variant(segment.variant)
            ));
        }
    }
    Ok(out)
}

fn describe_resolution(resolution: &Resolution) -> String {
    format!(
        "{}  {}  #{} {}",
        resolution.value.bold(),
        paint_variant(resolution.variant),
        resolution.rule_index,
        resolution.metadata.describe()
    )
}
