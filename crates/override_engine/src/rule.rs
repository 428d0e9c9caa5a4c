//! Override rule model.
//!
//! An [`OverrideRule`] binds a value to a setting, together with a priority and a
//! [`RuleKind`] that says *when* the rule may occupy a minute:
//!
//! | Kind          | Applicable on                                                        |
//! |---------------|----------------------------------------------------------------------|
//! | `Standard`    | every minute of every day                                            |
//! | `Scheduled`   | minutes inside its window on the listed weekdays                     |
//! | `TimeRange`   | minutes inside `[from, to]`, narrowed by an optional window/weekdays |
//! | `Conditional` | minutes inside its window, if it declares one                        |
//!
//! Lower priority numbers win. Equal priorities fall back to the class precedence
//! of the kind: TimeRange (1), Scheduled and Conditional (2), Standard (3).
//!
//! # Serialized Form
//!
//! Rules are flat records tagged by `type`. In a TOML host file:
//!
//! ```toml
//! [[rules]]
//! type = "standard"
//! setting_name = "thermostat"
//! value = "20"
//!
//! [[rules]]
//! type = "scheduled"
//! setting_name = "thermostat"
//! value = "24"
//! priority = 50
//! window = { from_hour = 6, to_hour = 9 }
//! days_of_week = [0, 1, 2, 3, 4]
//!
//! [[rules]]
//! type = "time_range"
//! setting_name = "thermostat"
//! value = "16"
//! from_date_time = "2024-08-01T00:00:00"
//! to_date_time = "2024-08-14T23:59:00"
//! ```
//!
//! `priority` defaults to 99, `enabled` to `true` and a scheduled rule's
//! `days_of_week` to the whole week.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::{
    errors::{EngineError, EngineResult},
    time_window::{MinuteOfDay, TimeWindow, MINUTES_PER_DAY},
};

/// Priority assigned to rules that do not specify one.
pub const DEFAULT_PRIORITY: u32 = 99;

/// Rule priority. Lower numbers take precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Priority(u32);

impl Priority {
    /// Creates a priority.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidRule` for `0`; priorities are positive.
    pub fn new(value: u32) -> EngineResult<Self> {
        if value == 0 {
            return Err(EngineError::invalid_rule("priority", "must be a positive integer"));
        }
        Ok(Self(value))
    }

    /// Numeric priority value.
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self(DEFAULT_PRIORITY)
    }
}

impl TryFrom<u32> for Priority {
    type Error = EngineError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Priority::new(value)
    }
}

impl From<Priority> for u32 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A non-empty set of weekdays, indexed Monday-first (0 = Monday, 6 = Sunday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Weekdays(u8);

impl Weekdays {
    const ALL_BITS: u8 = 0b0111_1111;
    const NAMES: [&'static str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

    /// Builds a set from Monday-first day indices.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidRule` if the set is empty or an index is
    /// larger than 6.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use override_engine::Weekdays;
    /// use chrono::Weekday;
    ///
    /// let workdays = Weekdays::new([0, 1, 2, 3, 4])?;
    /// assert!(workdays.contains(Weekday::Tue));
    /// assert!(!workdays.contains(Weekday::Sun));
    /// # Ok::<(), override_engine::EngineError>(())
    /// ```
    pub fn new(days: impl IntoIterator<Item = u8>) -> EngineResult<Self> {
        let mut bits = 0u8;
        for day in days {
            if day > 6 {
                return Err(EngineError::invalid_rule(
                    "days_of_week",
                    format!("day index {} is outside 0..=6", day),
                ));
            }
            bits |= 1 << day;
        }
        if bits == 0 {
            return Err(EngineError::invalid_rule("days_of_week", "at least one day is required"));
        }
        Ok(Self(bits))
    }

    /// Every day of the week.
    pub fn all() -> Self {
        Self(Self::ALL_BITS)
    }

    /// Whether the Monday-first day index is in the set.
    pub fn contains_index(&self, day: u8) -> bool {
        day <= 6 && self.0 & (1 << day) != 0
    }

    /// Whether `weekday` is in the set.
    pub fn contains(&self, weekday: Weekday) -> bool {
        // chrono's Monday-first numbering matches the stored indices
        self.contains_index(weekday.num_days_from_monday() as u8)
    }

    /// Whether the set covers the weekday of `date`.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.contains(date.weekday())
    }

    /// Monday-first day indices in ascending order.
    pub fn indices(&self) -> Vec<u8> {
        (0..7).filter(|day| self.contains_index(*day)).collect()
    }
}

impl TryFrom<Vec<u8>> for Weekdays {
    type Error = EngineError;

    fn try_from(days: Vec<u8>) -> Result<Self, Self::Error> {
        Weekdays::new(days)
    }
}

impl From<Weekdays> for Vec<u8> {
    fn from(days: Weekdays) -> Self {
        days.indices()
    }
}

impl std::fmt::Display for Weekdays {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self
            .indices()
            .into_iter()
            .map(|day| Self::NAMES[usize::from(day)])
            .collect();
        write!(f, "{}", names.join(","))
    }
}

/// Comparison applied by a conditional rule's external predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionOperator {
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessOrEqual,
}

impl ConditionOperator {
    /// Operator symbol as written in rule snapshots.
    pub fn symbol(&self) -> &'static str {
        match self {
            ConditionOperator::Equal => "==",
            ConditionOperator::NotEqual => "!=",
            ConditionOperator::GreaterThan => ">",
            ConditionOperator::GreaterOrEqual => ">=",
            ConditionOperator::LessThan => "<",
            ConditionOperator::LessOrEqual => "<=",
        }
    }
}

impl std::fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Rule variant without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleVariant {
    Standard,
    Scheduled,
    TimeRange,
    Conditional,
}

impl RuleVariant {
    /// Tie-break rank among rules of equal priority. Lower wins.
    pub fn class_precedence(&self) -> u8 {
        match self {
            RuleVariant::TimeRange => 1,
            RuleVariant::Scheduled | RuleVariant::Conditional => 2,
            RuleVariant::Standard => 3,
        }
    }
}

impl std::fmt::Display for RuleVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleVariant::Standard => write!(f, "standard"),
            RuleVariant::Scheduled => write!(f, "scheduled"),
            RuleVariant::TimeRange => write!(f, "time_range"),
            RuleVariant::Conditional => write!(f, "conditional"),
        }
    }
}

/// Recurring weekly override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledRule {
    pub window: TimeWindow,

    #[serde(default = "Weekdays::all")]
    pub days_of_week: Weekdays,
}

/// Override bound to an absolute, inclusive interval of local date-times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRangeRule {
    pub from_date_time: NaiveDateTime,
    pub to_date_time: NaiveDateTime,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<TimeWindow>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Weekdays>,
}

impl TimeRangeRule {
    /// Creates an unfiltered range.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidRule` if `from` is after `to`.
    pub fn new(from: NaiveDateTime, to: NaiveDateTime) -> EngineResult<Self> {
        let range = Self {
            from_date_time: from,
            to_date_time: to,
            window: None,
            days_of_week: None,
        };
        range.validate()?;
        Ok(range)
    }

    /// Restricts the range to a time-of-day window.
    pub fn with_window(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// Restricts the range to a set of weekdays.
    pub fn with_days_of_week(mut self, days: Weekdays) -> Self {
        self.days_of_week = Some(days);
        self
    }

    fn validate(&self) -> EngineResult<()> {
        if self.from_date_time > self.to_date_time {
            return Err(EngineError::invalid_rule(
                "to_date_time",
                format!(
                    "{} is before from_date_time {}",
                    self.to_date_time, self.from_date_time
                ),
            ));
        }
        Ok(())
    }

    /// Inclusive minute span of `date` covered by the absolute bounds, ignoring
    /// the window and weekday filters.
    ///
    /// Minute `m` is covered when `date 00:00 + m minutes` lies in
    /// `[from_date_time, to_date_time]`.
    pub fn clipped_span(&self, date: NaiveDate) -> Option<(MinuteOfDay, MinuteOfDay)> {
        let day_start = date.and_time(chrono::NaiveTime::MIN);
        let last_minute = MINUTES_PER_DAY as i64 - 1;

        let first = if self.from_date_time <= day_start {
            0
        } else {
            let offset = self.from_date_time - day_start;
            let whole = offset.num_minutes();
            if offset > Duration::minutes(whole) {
                whole + 1
            } else {
                whole
            }
        };

        if self.to_date_time < day_start {
            return None;
        }
        let last = (self.to_date_time - day_start)
            .num_minutes()
            .min(last_minute);

        if first > last {
            return None;
        }
        Some((first as MinuteOfDay, last as MinuteOfDay))
    }

    /// Whether the rule applies to `minute` of `date`, with all filters.
    pub fn applies_at(&self, date: NaiveDate, minute: MinuteOfDay) -> bool {
        if let Some(days) = &self.days_of_week {
            if !days.contains_date(date) {
                return false;
            }
        }
        if let Some(window) = &self.window {
            if !window.contains(minute) {
                return false;
            }
        }
        let timestamp =
            date.and_time(chrono::NaiveTime::MIN) + Duration::minutes(i64::from(minute));
        self.from_date_time <= timestamp && timestamp <= self.to_date_time
    }
}

/// Override active while an external predicate over another setting holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalRule {
    pub source_setting: String,
    pub operator: ConditionOperator,

    #[serde(deserialize_with = "deserialize_opaque_value")]
    pub comparison_value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<TimeWindow>,
}

/// Variant-specific part of a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleKind {
    Standard,
    Scheduled(ScheduledRule),
    TimeRange(TimeRangeRule),
    Conditional(ConditionalRule),
}

/// A single override rule for one setting.
///
/// # Examples
///
/// ```rust
/// use override_engine::{OverrideRule, RuleVariant, TimeWindow, Weekdays};
///
/// let base = OverrideRule::standard("thermostat", "20", 99)?;
/// let morning = OverrideRule::scheduled(
///     "thermostat",
///     "24",
///     50,
///     TimeWindow::new(6.0, 9.0)?,
///     Weekdays::new([0, 1, 2, 3, 4])?,
/// )?;
///
/// assert_eq!(base.variant(), RuleVariant::Standard);
/// assert_eq!(morning.class_precedence(), 2);
/// # Ok::<(), override_engine::EngineError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRule {
    pub setting_name: String,

    #[serde(deserialize_with = "deserialize_opaque_value")]
    pub value: String,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(flatten)]
    pub kind: RuleKind,
}

fn default_enabled() -> bool {
    true
}

impl OverrideRule {
    /// Creates a validated, enabled rule.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidRule` if the setting name is empty, the
    /// priority is zero, or the kind's payload is inconsistent.
    pub fn new(
        setting_name: impl Into<String>,
        value: impl Into<String>,
        priority: u32,
        kind: RuleKind,
    ) -> EngineResult<Self> {
        let rule = Self {
            setting_name: setting_name.into(),
            value: value.into(),
            priority: Priority::new(priority)?,
            enabled: true,
            kind,
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Creates a standard (base value) rule.
    pub fn standard(
        setting_name: impl Into<String>,
        value: impl Into<String>,
        priority: u32,
    ) -> EngineResult<Self> {
        Self::new(setting_name, value, priority, RuleKind::Standard)
    }

    /// Creates a scheduled weekly rule.
    pub fn scheduled(
        setting_name: impl Into<String>,
        value: impl Into<String>,
        priority: u32,
        window: TimeWindow,
        days_of_week: Weekdays,
    ) -> EngineResult<Self> {
        Self::new(
            setting_name,
            value,
            priority,
            RuleKind::Scheduled(ScheduledRule {
                window,
                days_of_week,
            }),
        )
    }

    /// Creates an absolute time-range rule.
    pub fn time_range(
        setting_name: impl Into<String>,
        value: impl Into<String>,
        priority: u32,
        range: TimeRangeRule,
    ) -> EngineResult<Self> {
        Self::new(setting_name, value, priority, RuleKind::TimeRange(range))
    }

    /// Creates a conditional rule.
    pub fn conditional(
        setting_name: impl Into<String>,
        value: impl Into<String>,
        priority: u32,
        condition: ConditionalRule,
    ) -> EngineResult<Self> {
        Self::new(setting_name, value, priority, RuleKind::Conditional(condition))
    }

    /// Returns the rule with its enabled flag replaced.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Checks the invariants that serde cannot enforce field by field.
    pub fn validate(&self) -> EngineResult<()> {
        if self.setting_name.trim().is_empty() {
            return Err(EngineError::invalid_rule("setting_name", "must not be empty"));
        }
        match &self.kind {
            RuleKind::Standard | RuleKind::Scheduled(_) => Ok(()),
            RuleKind::TimeRange(range) => range.validate(),
            RuleKind::Conditional(condition) => {
                if condition.source_setting.trim().is_empty() {
                    return Err(EngineError::invalid_rule("source_setting", "must not be empty"));
                }
                Ok(())
            }
        }
    }

    /// The rule's variant.
    pub fn variant(&self) -> RuleVariant {
        match self.kind {
            RuleKind::Standard => RuleVariant::Standard,
            RuleKind::Scheduled(_) => RuleVariant::Scheduled,
            RuleKind::TimeRange(_) => RuleVariant::TimeRange,
            RuleKind::Conditional(_) => RuleVariant::Conditional,
        }
    }

    /// Tie-break rank of the rule's variant.
    pub fn class_precedence(&self) -> u8 {
        self.variant().class_precedence()
    }

    /// Whether this is a conditional rule with no window, which the day
    /// resolver leaves to the external predicate evaluator.
    pub fn is_day_long_conditional(&self) -> bool {
        matches!(&self.kind, RuleKind::Conditional(condition) if condition.window.is_none())
    }

    /// Half-open minute ranges of `date` this rule may occupy, in ascending
    /// order within each source range.
    pub fn minute_ranges_on(&self, date: NaiveDate) -> Vec<(MinuteOfDay, MinuteOfDay)> {
        match &self.kind {
            RuleKind::Standard => vec![(0, MINUTES_PER_DAY as MinuteOfDay)],
            RuleKind::Scheduled(scheduled) => {
                if scheduled.days_of_week.contains_date(date) {
                    scheduled.window.ranges()
                } else {
                    Vec::new()
                }
            }
            RuleKind::Conditional(condition) => condition
                .window
                .map(|window| window.ranges())
                .unwrap_or_default(),
            RuleKind::TimeRange(range) => time_range_ranges(range, date),
        }
    }

    /// Whether this rule may occupy `minute` of `date`.
    ///
    /// Agrees minute for minute with [`OverrideRule::minute_ranges_on`].
    pub fn applies_at(&self, date: NaiveDate, minute: MinuteOfDay) -> bool {
        match &self.kind {
            RuleKind::Standard => true,
            RuleKind::Scheduled(scheduled) => {
                scheduled.days_of_week.contains_date(date) && scheduled.window.contains(minute)
            }
            RuleKind::Conditional(condition) => condition
                .window
                .map(|window| window.contains(minute))
                .unwrap_or(false),
            RuleKind::TimeRange(range) => range.applies_at(date, minute),
        }
    }
}

fn time_range_ranges(range: &TimeRangeRule, date: NaiveDate) -> Vec<(MinuteOfDay, MinuteOfDay)> {
    if let Some(days) = &range.days_of_week {
        if !days.contains_date(date) {
            return Vec::new();
        }
    }
    let Some((first, last)) = range.clipped_span(date) else {
        return Vec::new();
    };
    let span_end = last + 1;

    match &range.window {
        None => vec![(first, span_end)],
        Some(window) => window
            .ranges()
            .into_iter()
            .filter_map(|(start, end)| {
                let start = start.max(first);
                let end = end.min(span_end);
                (start < end).then_some((start, end))
            })
            .collect(),
    }
}

/// Accepts strings, numbers and booleans for opaque setting values.
fn deserialize_opaque_value<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct OpaqueValueVisitor;

    impl<'de> de::Visitor<'de> for OpaqueValueVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string, number or boolean setting value")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(OpaqueValueVisitor)
}

#[cfg(test)]
#[path = "rule_tests.rs"]
mod tests;
