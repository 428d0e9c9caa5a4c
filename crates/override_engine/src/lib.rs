//! Override resolution engine.
//!
//! Resolves which override rule is in effect for a named setting at every
//! minute of a calendar day, and compresses the result into contiguous segments
//! for display.
//!
//! A setting can carry a base value (standard rule) and any number of competing
//! overrides: weekly schedules, absolute time ranges and conditionals. Lower
//! priority numbers win; equal priorities are broken by rule class (time range,
//! then scheduled/conditional, then standard) and finally by input order.
//!
//! The engine is a pure, synchronous computation over an immutable rule
//! snapshot. It performs no I/O and holds no process-wide state; hosts load
//! rules in whatever format they store them and build a [`RuleSet`].
//!
//! # Examples
//!
//! ```rust
//! use chrono::NaiveDate;
//! use override_engine::{day_timeline, OverrideRule, TimeWindow, Weekdays};
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
//! let timeline = day_timeline("thermostat", tuesday, &rules);
//!
//! let spans: Vec<(u16, u16, &str)> = timeline
//!     .segments
//!     .iter()
//!     .map(|s| (s.start_minute, s.end_minute, s.value.as_str()))
//!     .collect();
//! assert_eq!(spans, vec![(0, 360, "20"), (360, 540, "24"), (540, 1440, "20")]);
//! # Ok::<(), override_engine::EngineError>(())
//! ```

pub mod day_resolver;
pub mod errors;
pub mod live;
pub mod point_query;
pub mod rule;
pub mod rule_set;
pub mod segments;
pub mod time_window;
pub mod timeline;

#[cfg(test)]
mod integration_tests;

// Re-export for convenient access
pub use day_resolver::{should_override, DayMap, DayResolver, MinuteEntry, Occupant};
pub use errors::{EngineError, EngineResult};
pub use live::{
    day_long_candidates, live_rules, resolve_live_day, ConditionalCandidate, PredicateEvaluator,
};
pub use point_query::{value_at, Resolution};
pub use rule::{
    ConditionOperator, ConditionalRule, OverrideRule, Priority, RuleKind, RuleVariant,
    ScheduledRule, TimeRangeRule, Weekdays, DEFAULT_PRIORITY,
};
pub use rule_set::RuleSet;
pub use segments::{compress, Segment, SegmentMetadata};
pub use time_window::{format_minute, MinuteOfDay, TimeWindow, MINUTES_PER_DAY};
pub use timeline::{day_timeline, forecast, sample_grid, DayTimeline, GridRow};
