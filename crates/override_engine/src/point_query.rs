//! Spot checks of the effective value at a single minute.
//!
//! The point query walks the same candidates as [`DayResolver::resolve`], in
//! the same pass order, with the same [`should_override`] comparator, but only
//! tests one minute. It never materializes the day map.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;

use crate::{
    day_resolver::{should_override, DayResolver, Occupant},
    errors::{EngineError, EngineResult},
    rule::{OverrideRule, Priority, RuleVariant},
    segments::SegmentMetadata,
    time_window::{MinuteOfDay, MINUTES_PER_DAY},
};

/// The rule in effect at one minute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub value: String,
    pub variant: RuleVariant,
    pub rule_index: usize,
    pub priority: Priority,
    pub metadata: SegmentMetadata,
}

impl Resolution {
    fn from_rule(rule_index: usize, rule: &OverrideRule) -> Self {
        Self {
            value: rule.value.clone(),
            variant: rule.variant(),
            rule_index,
            priority: rule.priority,
            metadata: SegmentMetadata::from_rule(rule),
        }
    }
}

impl<'a> DayResolver<'a> {
    /// Effective rule at `minute` of `date`, or `None` if nothing is in effect.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidMinute` if `minute` is 1440 or larger.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use override_engine::{DayResolver, OverrideRule, TimeWindow, Weekdays};
    ///
    /// let rules = vec![
    ///     OverrideRule::standard("thermostat", "20", 99)?,
    ///     OverrideRule::scheduled(
    ///         "thermostat",
    ///         "24",
    ///         50,
    ///         TimeWindow::new(6.0, 9.0)?,
    ///         Weekdays::all(),
    ///     )?,
    /// ];
    /// let resolver = DayResolver::new("thermostat", &rules);
    /// let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
    ///
    /// let resolution = resolver.value_at(day, 7 * 60)?.unwrap();
    /// assert_eq!(resolution.value, "24");
    /// # Ok::<(), override_engine::EngineError>(())
    /// ```
    pub fn value_at(
        &self,
        date: NaiveDate,
        minute: MinuteOfDay,
    ) -> EngineResult<Option<Resolution>> {
        if usize::from(minute) >= MINUTES_PER_DAY {
            return Err(EngineError::InvalidMinute {
                minute: u32::from(minute),
            });
        }
        Ok(self.resolve_minute(date, minute))
    }

    /// Effective rule at a local date-time; seconds are ignored.
    pub fn value_at_time(&self, at: NaiveDateTime) -> Option<Resolution> {
        // chrono keeps hour < 24 and minute < 60
        let minute = (at.hour() * 60 + at.minute()) as MinuteOfDay;
        self.resolve_minute(at.date(), minute)
    }

    /// Point query for a minute already known to lie inside the day.
    fn resolve_minute(&self, date: NaiveDate, minute: MinuteOfDay) -> Option<Resolution> {
        let mut winner: Option<(Occupant, &OverrideRule)> = None;
        for (rule_index, rule) in self.ordered_candidates() {
            if !rule.applies_at(date, minute) {
                continue;
            }
            let class_precedence = rule.class_precedence();
            if should_override(
                winner.as_ref().map(|(occupant, _)| occupant),
                rule.priority,
                class_precedence,
            ) {
                winner = Some((
                    Occupant {
                        rule_index,
                        priority: rule.priority,
                        class_precedence,
                    },
                    rule,
                ));
            }
        }

        winner.map(|(occupant, rule)| Resolution::from_rule(occupant.rule_index, rule))
    }
}

/// Effective rule for `setting_name` at `minute` of `date`.
pub fn value_at(
    setting_name: &str,
    date: NaiveDate,
    minute: MinuteOfDay,
    rules: &[OverrideRule],
) -> EngineResult<Option<Resolution>> {
    DayResolver::new(setting_name, rules).value_at(date, minute)
}

#[cfg(test)]
#[path = "point_query_tests.rs"]
mod tests;
