//! Live view support for conditional rules without a window.
//!
//! The day resolver does not place windowless conditionals because whether
//! they apply depends on live state it cannot see. This module exposes them to
//! an external [`PredicateEvaluator`] and turns every active one into an ad-hoc
//! time range running from "now" to the end of the current day, which the
//! ordinary resolver can then place.

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;
use tracing::debug;

use crate::{
    day_resolver::DayResolver,
    rule::{ConditionOperator, OverrideRule, Priority, RuleKind, TimeRangeRule},
    segments::{compress, Segment},
};

/// A windowless conditional rule awaiting an external decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionalCandidate {
    /// Input position of the conditional rule.
    pub rule_index: usize,
    pub setting_name: String,
    pub source_setting: String,
    pub operator: ConditionOperator,
    pub comparison_value: String,
    pub value: String,
    pub priority: Priority,
}

/// Decides whether a conditional candidate's predicate currently holds.
pub trait PredicateEvaluator {
    fn is_active(&self, candidate: &ConditionalCandidate) -> bool;
}

impl<F> PredicateEvaluator for F
where
    F: Fn(&ConditionalCandidate) -> bool,
{
    fn is_active(&self, candidate: &ConditionalCandidate) -> bool {
        self(candidate)
    }
}

/// Lists the enabled windowless conditionals of `setting_name`, in input order.
pub fn day_long_candidates(
    setting_name: &str,
    rules: &[OverrideRule],
) -> Vec<ConditionalCandidate> {
    rules
        .iter()
        .enumerate()
        .filter(|(_, rule)| rule.enabled && rule.setting_name == setting_name)
        .filter_map(|(rule_index, rule)| match &rule.kind {
            RuleKind::Conditional(condition) if condition.window.is_none() => {
                Some(ConditionalCandidate {
                    rule_index,
                    setting_name: rule.setting_name.clone(),
                    source_setting: condition.source_setting.clone(),
                    operator: condition.operator,
                    comparison_value: condition.comparison_value.clone(),
                    value: rule.value.clone(),
                    priority: rule.priority,
                })
            }
            _ => None,
        })
        .collect()
}

/// Builds the rule snapshot for a live view at `now`.
///
/// Each active windowless conditional is replaced, at its original position, by
/// a time range `[now floored to the minute, 23:59 of today]` with the same
/// value and priority. Inactive ones are dropped. All other rules pass through
/// unchanged, so the relative input order of the remaining rules is preserved.
pub fn live_rules<E>(
    setting_name: &str,
    rules: &[OverrideRule],
    evaluator: &E,
    now: NaiveDateTime,
) -> Vec<OverrideRule>
where
    E: PredicateEvaluator + ?Sized,
{
    let candidates = day_long_candidates(setting_name, rules);
    let start = now
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now);
    let end = now.date().and_time(NaiveTime::MIN) + Duration::minutes(23 * 60 + 59);

    let mut live = Vec::with_capacity(rules.len());
    for (rule_index, rule) in rules.iter().enumerate() {
        let Some(candidate) = candidates.iter().find(|c| c.rule_index == rule_index) else {
            live.push(rule.clone());
            continue;
        };

        if !evaluator.is_active(candidate) {
            debug!(
                setting = setting_name,
                rule_index,
                source = %candidate.source_setting,
                "Conditional inactive, dropped from live view"
            );
            continue;
        }

        // start never exceeds end: both sit on now's date and start is at most 23:59
        let range = TimeRangeRule {
            from_date_time: start,
            to_date_time: end,
            window: None,
            days_of_week: None,
        };
        debug!(
            setting = setting_name,
            rule_index,
            source = %candidate.source_setting,
            "Conditional active, placed as time range until end of day"
        );
        live.push(OverrideRule {
            setting_name: rule.setting_name.clone(),
            value: rule.value.clone(),
            priority: rule.priority,
            enabled: true,
            kind: RuleKind::TimeRange(range),
        });
    }
    live
}

/// Segments for today's live view, with active conditionals placed.
pub fn resolve_live_day<E>(
    setting_name: &str,
    rules: &[OverrideRule],
    evaluator: &E,
    now: NaiveDateTime,
) -> Vec<Segment>
where
    E: PredicateEvaluator + ?Sized,
{
    let live = live_rules(setting_name, rules, evaluator, now);
    compress(&DayResolver::new(setting_name, &live).resolve(now.date()))
}

#[cfg(test)]
#[path = "live_tests.rs"]
mod tests;
