//! Compression of per-minute ownership into contiguous segments.
//!
//! A [`Segment`] is a maximal run of minutes held by rules of the same variant
//! carrying the same value. Minutes with no occupant are gaps; they produce no
//! segment and always separate the runs on either side, even when those runs
//! share a value.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::{
    day_resolver::{DayMap, MinuteEntry},
    rule::{ConditionOperator, OverrideRule, Priority, RuleKind, RuleVariant, Weekdays},
    time_window::{format_minute, MinuteOfDay, TimeWindow},
};

/// Variant-specific details of the rule that opened a segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SegmentMetadata {
    Standard {
        priority: Priority,
    },
    Scheduled {
        window: TimeWindow,
        days_of_week: Weekdays,
    },
    TimeRange {
        from_date_time: NaiveDateTime,
        to_date_time: NaiveDateTime,
        #[serde(skip_serializing_if = "Option::is_none")]
        window: Option<TimeWindow>,
        #[serde(skip_serializing_if = "Option::is_none")]
        days_of_week: Option<Weekdays>,
    },
    Conditional {
        source_setting: String,
        operator: ConditionOperator,
        comparison_value: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        window: Option<TimeWindow>,
    },
}

impl SegmentMetadata {
    /// Extracts the descriptive fields of a rule.
    pub fn from_rule(rule: &OverrideRule) -> Self {
        match &rule.kind {
            RuleKind::Standard => SegmentMetadata::Standard {
                priority: rule.priority,
            },
            RuleKind::Scheduled(scheduled) => SegmentMetadata::Scheduled {
                window: scheduled.window,
                days_of_week: scheduled.days_of_week,
            },
            RuleKind::TimeRange(range) => SegmentMetadata::TimeRange {
                from_date_time: range.from_date_time,
                to_date_time: range.to_date_time,
                window: range.window,
                days_of_week: range.days_of_week,
            },
            RuleKind::Conditional(condition) => SegmentMetadata::Conditional {
                source_setting: condition.source_setting.clone(),
                operator: condition.operator,
                comparison_value: condition.comparison_value.clone(),
                window: condition.window,
            },
        }
    }

    /// Short human-readable description, e.g. `Mon,Tue 06:00-09:00`.
    pub fn describe(&self) -> String {
        match self {
            SegmentMetadata::Standard { priority } => format!("priority {}", priority),
            SegmentMetadata::Scheduled {
                window,
                days_of_week,
            } => format!("{} {}", days_of_week, window),
            SegmentMetadata::TimeRange {
                from_date_time,
                to_date_time,
                ..
            } => format!(
                "{} to {}",
                from_date_time.format("%Y-%m-%d %H:%M"),
                to_date_time.format("%Y-%m-%d %H:%M")
            ),
            SegmentMetadata::Conditional {
                source_setting,
                operator,
                comparison_value,
                ..
            } => format!("when {} {} {}", source_setting, operator, comparison_value),
        }
    }
}

/// A contiguous run of minutes with one resolved value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub start_minute: MinuteOfDay,

    /// Exclusive; at most 1440.
    pub end_minute: MinuteOfDay,

    pub value: String,
    pub variant: RuleVariant,

    /// Input position of the rule that opened the segment.
    pub rule_index: usize,

    pub priority: Priority,
    pub metadata: SegmentMetadata,
}

impl Segment {
    fn open(entry: &MinuteEntry<'_>) -> Self {
        Self {
            start_minute: entry.minute,
            end_minute: entry.minute + 1,
            value: entry.value.to_string(),
            variant: entry.rule.variant(),
            rule_index: entry.rule_index,
            priority: entry.rule.priority,
            metadata: SegmentMetadata::from_rule(entry.rule),
        }
    }

    fn continues_with(&self, entry: &MinuteEntry<'_>) -> bool {
        self.end_minute == entry.minute
            && self.variant == entry.rule.variant()
            && self.value == entry.value
    }

    /// Number of minutes covered.
    pub fn duration_minutes(&self) -> usize {
        usize::from(self.end_minute - self.start_minute)
    }

    /// Whether `minute` falls inside the segment.
    pub fn contains(&self, minute: MinuteOfDay) -> bool {
        self.start_minute <= minute && minute < self.end_minute
    }

    /// `HH:MM-HH:MM value` label for hosts that render timelines.
    pub fn label(&self) -> String {
        format!(
            "{}-{} {}",
            format_minute(usize::from(self.start_minute)),
            format_minute(usize::from(self.end_minute)),
            self.value
        )
    }
}

/// Collapses a day map into ordered, disjoint segments.
///
/// # Examples
///
/// ```rust
/// use chrono::NaiveDate;
/// use override_engine::{compress, DayResolver, OverrideRule, TimeWindow, Weekdays};
///
/// let rules = vec![
///     OverrideRule::standard("thermostat", "20", 99)?,
///     OverrideRule::scheduled(
///         "thermostat",
///         "24",
///         50,
///         TimeWindow::new(6.0, 9.0)?,
///         Weekdays::new([0, 1, 2, 3, 4])?,
///     )?,
/// ];
/// let tuesday = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
///
/// let segments = compress(&DayResolver::new("thermostat", &rules).resolve(tuesday));
/// let labels: Vec<String> = segments.iter().map(|s| s.label()).collect();
/// assert_eq!(labels, vec!["00:00-06:00 20", "06:00-09:00 24", "09:00-24:00 20"]);
/// # Ok::<(), override_engine::EngineError>(())
/// ```
pub fn compress(map: &DayMap<'_>) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current: Option<Segment> = None;

    for entry in map.entries() {
        match entry {
            None => {
                if let Some(segment) = current.take() {
                    segments.push(segment);
                }
            }
            Some(entry) => match current.as_mut() {
                Some(segment) if segment.continues_with(&entry) => {
                    segment.end_minute = entry.minute + 1;
                }
                _ => {
                    if let Some(segment) = current.replace(Segment::open(&entry)) {
                        segments.push(segment);
                    }
                }
            },
        }
    }
    if let Some(segment) = current {
        segments.push(segment);
    }

    segments
}

#[cfg(test)]
#[path = "segments_tests.rs"]
mod tests;
