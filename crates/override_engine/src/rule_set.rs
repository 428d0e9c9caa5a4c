//! Immutable rule snapshots.
//!
//! A [`RuleSet`] holds the rules of every setting as fetched from the
//! configuration store. It is validated once on construction and then only
//! read. Rule positions in the snapshot are the `rule_index` values that
//! segments and resolutions report. Hosts own the storage format; the rules
//! themselves are serde types.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::{
    day_resolver::DayResolver,
    errors::{EngineError, EngineResult},
    point_query::Resolution,
    rule::OverrideRule,
    timeline::{day_timeline, forecast, DayTimeline},
};

/// Snapshot of override rules across all settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RuleSet {
    rules: Vec<OverrideRule>,
}

impl RuleSet {
    /// Creates a validated snapshot.
    ///
    /// # Errors
    ///
    /// Returns the first `EngineError::InvalidRule` found, with the rule's
    /// position prefixed to the field name.
    pub fn new(rules: Vec<OverrideRule>) -> EngineResult<Self> {
        let set = Self { rules };
        set.validate()?;
        Ok(set)
    }

    fn validate(&self) -> EngineResult<()> {
        for (index, rule) in self.rules.iter().enumerate() {
            rule.validate().map_err(|error| match error {
                EngineError::InvalidRule { field, reason } => EngineError::InvalidRule {
                    field: format!("rules[{}].{}", index, field),
                    reason,
                },
                other => other,
            })?;
        }
        Ok(())
    }

    /// All rules in snapshot order.
    pub fn rules(&self) -> &[OverrideRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Distinct setting names, sorted.
    pub fn setting_names(&self) -> Vec<String> {
        self.rules
            .iter()
            .map(|rule| rule.setting_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Enabled rules of one setting, in snapshot order.
    ///
    /// This is the pre-filtered list the resolver contract expects. Positions in
    /// the returned list differ from snapshot positions.
    pub fn for_setting(&self, setting_name: &str) -> Vec<OverrideRule> {
        self.rules
            .iter()
            .filter(|rule| rule.enabled && rule.setting_name == setting_name)
            .cloned()
            .collect()
    }

    /// Resolver for one setting over the whole snapshot.
    pub fn resolver<'a>(&'a self, setting_name: &'a str) -> DayResolver<'a> {
        DayResolver::new(setting_name, &self.rules)
    }

    /// Segments of one setting on `date`.
    pub fn day_timeline(&self, setting_name: &str, date: NaiveDate) -> DayTimeline {
        day_timeline(setting_name, date, &self.rules)
    }

    /// Segments of one setting over `days` dates from `start`.
    pub fn forecast(
        &self,
        setting_name: &str,
        start: NaiveDate,
        days: u32,
    ) -> EngineResult<Vec<DayTimeline>> {
        forecast(setting_name, &self.rules, start, days)
    }

    /// Effective value of every setting at `at`. Settings with nothing in
    /// effect are omitted.
    pub fn effective_values(&self, at: NaiveDateTime) -> BTreeMap<String, Resolution> {
        self.setting_names()
            .into_iter()
            .filter_map(|name| {
                let resolution = self.resolver(&name).value_at_time(at)?;
                Some((name, resolution))
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "rule_set_tests.rs"]
mod tests;
