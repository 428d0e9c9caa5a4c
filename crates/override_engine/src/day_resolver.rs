//! Per-minute resolution of competing override rules for one day.
//!
//! The resolver walks the rules of one setting in a fixed pass order and writes
//! each rule into the minutes it may occupy, using [`should_override`] to decide
//! whether a rule displaces the current occupant of a minute.
//!
//! # Pass Order
//!
//! 1. **Standard** - the base value, written to every minute
//! 2. **Scheduled** - weekly windows on matching weekdays
//! 3. **Conditional** - only conditionals that declare a window
//! 4. **TimeRange** - absolute intervals clipped to the day
//!
//! Within a pass rules are taken in input order. Because a candidate only
//! replaces an occupant it strictly beats, the first rule processed keeps a
//! minute against later rules of equal priority and class.
//!
//! # Examples
//!
//! ```rust
//! use chrono::NaiveDate;
//! use override_engine::{DayResolver, OverrideRule, TimeWindow, Weekdays};
//!
//! let rules = vec![
//!     OverrideRule::standard("thermostat", "20", 99)?,
//!     OverrideRule::scheduled(
//!         "thermostat",
//!         "24",
//!         50,
//!         TimeWindow::new(6.0, 9.0)?,
//!         Weekdays::new([0, 1, 2, 3, 4])?,
//!     )?,
//! ];
//!
//! let tuesday = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
//! let map = DayResolver::new("thermostat", &rules).resolve(tuesday);
//!
//! assert_eq!(map.entry(5 * 60).map(|e| e.value), Some("20"));
//! assert_eq!(map.entry(7 * 60).map(|e| e.value), Some("24"));
//! # Ok::<(), override_engine::EngineError>(())
//! ```

use chrono::NaiveDate;
use tracing::{debug, trace};

use crate::{
    rule::{OverrideRule, Priority, RuleKind},
    time_window::{MinuteOfDay, MINUTES_PER_DAY},
};

/// Rule currently holding a minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupant {
    /// Position of the rule in the input snapshot.
    pub rule_index: usize,
    pub priority: Priority,
    pub class_precedence: u8,
}

/// Decides whether a candidate displaces the existing occupant of a minute.
///
/// A lower priority number wins. On equal priority the lower class precedence
/// wins. A full tie keeps the existing occupant.
pub fn should_override(
    existing: Option<&Occupant>,
    candidate_priority: Priority,
    candidate_class_precedence: u8,
) -> bool {
    let Some(existing) = existing else {
        return true;
    };
    if candidate_priority != existing.priority {
        return candidate_priority < existing.priority;
    }
    candidate_class_precedence < existing.class_precedence
}

/// Resolution pass a rule is placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum ResolutionPass {
    Standard,
    Scheduled,
    Conditional,
    TimeRange,
}

impl ResolutionPass {
    const ORDER: [ResolutionPass; 4] = [
        ResolutionPass::Standard,
        ResolutionPass::Scheduled,
        ResolutionPass::Conditional,
        ResolutionPass::TimeRange,
    ];

    /// Pass for a rule, or `None` for windowless conditionals.
    fn of(rule: &OverrideRule) -> Option<ResolutionPass> {
        match &rule.kind {
            RuleKind::Standard => Some(ResolutionPass::Standard),
            RuleKind::Scheduled(_) => Some(ResolutionPass::Scheduled),
            RuleKind::Conditional(condition) => {
                condition.window.map(|_| ResolutionPass::Conditional)
            }
            RuleKind::TimeRange(_) => Some(ResolutionPass::TimeRange),
        }
    }
}

/// Resolves the rules of one setting into per-minute ownership.
///
/// This is a stateless view over an immutable rule snapshot; resolving the same
/// date twice yields identical maps.
#[derive(Debug, Clone, Copy)]
pub struct DayResolver<'a> {
    setting_name: &'a str,
    rules: &'a [OverrideRule],
}

impl<'a> DayResolver<'a> {
    /// Creates a resolver for `setting_name` over a rule snapshot.
    ///
    /// The snapshot is expected to hold the enabled rules of this setting. Any
    /// disabled rule or rule for another setting is ignored.
    pub fn new(setting_name: &'a str, rules: &'a [OverrideRule]) -> Self {
        Self {
            setting_name,
            rules,
        }
    }

    /// Setting this resolver answers for.
    pub fn setting_name(&self) -> &'a str {
        self.setting_name
    }

    /// The rule snapshot.
    pub fn rules(&self) -> &'a [OverrideRule] {
        self.rules
    }

    /// Rules eligible for this setting, in resolution order, with their input
    /// positions.
    pub(crate) fn ordered_candidates(&self) -> Vec<(usize, &'a OverrideRule)> {
        let mut staged: Vec<(ResolutionPass, usize, &'a OverrideRule)> = Vec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            if !rule.enabled {
                trace!(setting = self.setting_name, rule_index = index, "Skipping disabled rule");
                continue;
            }
            if rule.setting_name != self.setting_name {
                trace!(
                    setting = self.setting_name,
                    rule_index = index,
                    other_setting = %rule.setting_name,
                    "Skipping rule for another setting"
                );
                continue;
            }
            if let Some(pass) = ResolutionPass::of(rule) {
                staged.push((pass, index, rule));
            }
        }

        let mut ordered = Vec::with_capacity(staged.len());
        for pass in ResolutionPass::ORDER {
            ordered.extend(
                staged
                    .iter()
                    .filter(|(rule_pass, _, _)| *rule_pass == pass)
                    .map(|(_, index, rule)| (*index, *rule)),
            );
        }
        ordered
    }

    /// Builds the 1440-minute ownership map for `date`.
    pub fn resolve(&self, date: NaiveDate) -> DayMap<'a> {
        let mut slots: Vec<Option<Occupant>> = vec![None; MINUTES_PER_DAY];

        for (rule_index, rule) in self.ordered_candidates() {
            let priority = rule.priority;
            let class_precedence = rule.class_precedence();
            let mut claimed = 0usize;

            for (start, end) in rule.minute_ranges_on(date) {
                for minute in start..end {
                    let slot = &mut slots[usize::from(minute)];
                    if should_override(slot.as_ref(), priority, class_precedence) {
                        *slot = Some(Occupant {
                            rule_index,
                            priority,
                            class_precedence,
                        });
                        claimed += 1;
                    }
                }
            }

            trace!(
                setting = self.setting_name,
                %date,
                rule_index,
                variant = %rule.variant(),
                claimed,
                "Applied rule"
            );
        }

        let map = DayMap {
            setting_name: self.setting_name,
            date,
            rules: self.rules,
            slots,
        };
        debug!(
            setting = self.setting_name,
            %date,
            occupied = map.occupied_minutes(),
            "Resolved day"
        );
        map
    }
}

/// Resolved view of one minute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinuteEntry<'a> {
    pub minute: MinuteOfDay,
    pub rule_index: usize,
    pub rule: &'a OverrideRule,
    pub value: &'a str,
    pub class_precedence: u8,
}

/// Per-minute ownership for one `(date, setting)` pair.
#[derive(Debug, Clone)]
pub struct DayMap<'a> {
    setting_name: &'a str,
    date: NaiveDate,
    rules: &'a [OverrideRule],
    slots: Vec<Option<Occupant>>,
}

impl<'a> DayMap<'a> {
    pub fn setting_name(&self) -> &'a str {
        self.setting_name
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Occupant of `minute`, or `None` for an empty minute or out-of-range index.
    pub fn occupant(&self, minute: MinuteOfDay) -> Option<&Occupant> {
        self.slots.get(usize::from(minute)).and_then(Option::as_ref)
    }

    /// Resolved rule and value at `minute`.
    pub fn entry(&self, minute: MinuteOfDay) -> Option<MinuteEntry<'a>> {
        let occupant = *self.occupant(minute)?;
        let rule = &self.rules[occupant.rule_index];
        Some(MinuteEntry {
            minute,
            rule_index: occupant.rule_index,
            rule,
            value: rule.value.as_str(),
            class_precedence: occupant.class_precedence,
        })
    }

    /// All 1440 minutes in order, `None` where nothing is in effect.
    pub fn entries(&self) -> impl Iterator<Item = Option<MinuteEntry<'a>>> + '_ {
        (0..MINUTES_PER_DAY as MinuteOfDay).map(move |minute| self.entry(minute))
    }

    /// Number of minutes held by some rule.
    pub fn occupied_minutes(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

#[cfg(test)]
#[path = "day_resolver_tests.rs"]
mod tests;
