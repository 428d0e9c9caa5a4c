//! Day timelines, multi-day forecasts and sampled grids.
//!
//! These are the entry points most hosts call: they run the day resolver and
//! the segment compressor for one or more consecutive dates.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::{
    day_resolver::DayResolver,
    errors::{EngineError, EngineResult},
    point_query::Resolution,
    rule::OverrideRule,
    segments::{compress, Segment},
    time_window::{MinuteOfDay, MINUTES_PER_DAY},
};

/// Resolved segments of one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayTimeline {
    pub date: NaiveDate,
    pub segments: Vec<Segment>,
}

impl DayTimeline {
    /// Segment covering `minute`, if any.
    pub fn segment_at(&self, minute: MinuteOfDay) -> Option<&Segment> {
        self.segments.iter().find(|segment| segment.contains(minute))
    }
}

/// Samples of the effective value across one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridRow {
    pub date: NaiveDate,

    /// `(minute, resolution)` for each sampled minute.
    pub samples: Vec<(MinuteOfDay, Option<Resolution>)>,
}

/// Resolves one date into segments.
///
/// # Examples
///
/// ```rust
/// use chrono::NaiveDate;
/// use override_engine::{day_timeline, OverrideRule};
///
/// let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
/// assert!(day_timeline("thermostat", day, &[]).segments.is_empty());
///
/// let rules = vec![OverrideRule::standard("thermostat", "20", 99)?];
/// let timeline = day_timeline("thermostat", day, &rules);
/// assert_eq!(timeline.segments.len(), 1);
/// # Ok::<(), override_engine::EngineError>(())
/// ```
pub fn day_timeline(setting_name: &str, date: NaiveDate, rules: &[OverrideRule]) -> DayTimeline {
    DayTimeline {
        date,
        segments: compress(&DayResolver::new(setting_name, rules).resolve(date)),
    }
}

/// Resolves `days` consecutive dates starting at `start`.
///
/// # Errors
///
/// Returns `EngineError::InvalidRule` on `days` if the last date would fall
/// past the end of the calendar.
pub fn forecast(
    setting_name: &str,
    rules: &[OverrideRule],
    start: NaiveDate,
    days: u32,
) -> EngineResult<Vec<DayTimeline>> {
    debug!(setting = setting_name, %start, days, "Building forecast");
    let resolver = DayResolver::new(setting_name, rules);
    Ok(dates(start, days)?
        .map(|date| DayTimeline {
            date,
            segments: compress(&resolver.resolve(date)),
        })
        .collect())
}

/// Samples the effective value every `step_minutes` over `days` dates.
///
/// Samples are taken at minutes `0, step, 2*step, ...` of each day.
///
/// # Errors
///
/// Returns `EngineError::InvalidRule` if `step_minutes` is 0 or larger
/// than a day, or if the last date would fall past the end of the calendar.
pub fn sample_grid(
    setting_name: &str,
    rules: &[OverrideRule],
    start: NaiveDate,
    days: u32,
    step_minutes: u16,
) -> EngineResult<Vec<GridRow>> {
    if step_minutes == 0 || usize::from(step_minutes) > MINUTES_PER_DAY {
        return Err(EngineError::invalid_rule(
            "step_minutes",
            format!("{} is outside 1..={}", step_minutes, MINUTES_PER_DAY),
        ));
    }

    let resolver = DayResolver::new(setting_name, rules);
    let mut rows = Vec::new();
    for date in dates(start, days)? {
        let samples = (0..MINUTES_PER_DAY as MinuteOfDay)
            .step_by(usize::from(step_minutes))
            .map(|minute| -> EngineResult<_> { Ok((minute, resolver.value_at(date, minute)?)) })
            .collect::<EngineResult<Vec<_>>>()?;
        rows.push(GridRow { date, samples });
    }
    Ok(rows)
}

/// `days` consecutive dates from `start`, checked against the calendar's end
/// before any work is done.
fn dates(start: NaiveDate, days: u32) -> EngineResult<impl Iterator<Item = NaiveDate>> {
    if let Some(last_offset) = days.checked_sub(1) {
        if start.checked_add_days(Days::new(u64::from(last_offset))).is_none() {
            return Err(EngineError::invalid_rule(
                "days",
                format!("{} days from {} pass the calendar's end", days, start),
            ));
        }
    }
    Ok(start.iter_days().take(days as usize))
}

#[cfg(test)]
#[path = "timeline_tests.rs"]
mod tests;
