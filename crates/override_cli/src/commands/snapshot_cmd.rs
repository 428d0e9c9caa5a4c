//! Snapshot validation command for the override-timeline CLI.

use colored::Colorize;
use override_engine::{RuleSet, RuleVariant};
use serde::Serialize;
use tracing::info;

use crate::commands::args::{to_json, OutputFormat};
use crate::config::TimelineConfig;
use crate::errors::Error;

#[cfg(test)]
#[path = "snapshot_cmd_tests.rs"]
mod tests;

/// Rule counts of one setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingSummary {
    pub setting_name: String,
    pub standard: usize,
    pub scheduled: usize,
    pub time_range: usize,
    pub conditional: usize,
    pub disabled: usize,
}

/// Result of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    pub rules: usize,
    pub settings: Vec<SettingSummary>,
}

/// Validates the configured rules and summarizes them per setting.
///
/// # Errors
///
/// Returns `Error::Engine` naming the first invalid rule.
pub fn validate(config: &TimelineConfig) -> Result<ValidationSummary, Error> {
    let snapshot = config.snapshot()?;
    let summary = summarize(&snapshot);
    info!(
        rules = summary.rules,
        settings = summary.settings.len(),
        "Snapshot is valid"
    );
    Ok(summary)
}

fn summarize(snapshot: &RuleSet) -> ValidationSummary {
    let settings = snapshot
        .setting_names()
        .into_iter()
        .map(|setting_name| {
            let mut summary = SettingSummary {
                setting_name,
                standard: 0,
                scheduled: 0,
                time_range: 0,
                conditional: 0,
                disabled: 0,
            };
            for rule in snapshot
                .rules()
                .iter()
                .filter(|rule| rule.setting_name == summary.setting_name)
            {
                if !rule.enabled {
                    summary.disabled += 1;
                    continue;
                }
                match rule.variant() {
                    RuleVariant::Standard => summary.standard += 1,
                    RuleVariant::Scheduled => summary.scheduled += 1,
                    RuleVariant::TimeRange => summary.time_range += 1,
                    RuleVariant::Conditional => summary.conditional += 1,
                }
            }
            summary
        })
        .collect();

    ValidationSummary {
        rules: snapshot.len(),
        settings,
    }
}

/// Renders a [`ValidationSummary`].
pub fn render_summary(summary: &ValidationSummary, format: OutputFormat) -> Result<String, Error> {
    if format == OutputFormat::Json {
        return to_json(summary);
    }

    let mut out = format!(
        "{} {} rules across {} settings\n",
        "Snapshot valid:".green(),
        summary.rules,
        summary.settings.len()
    );
    for setting in &summary.settings {
        out.push_str(&format!(
            "  {}: {} standard, {} scheduled, {} time range, {} conditional",
            setting.setting_name.bold(),
            setting.standard,
            setting.scheduled,
            setting.time_range,
            setting.conditional
        ));
        if setting.disabled > 0 {
            out.push_str(&format!(", {} disabled", setting.disabled));
        }
        out.push('\n');
    }
    Ok(out)
}
