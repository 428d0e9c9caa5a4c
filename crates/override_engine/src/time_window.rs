//! Time-of-day windows with midnight-wrap semantics.
//!
//! A [`TimeWindow`] is a pure value describing a recurring interval of the day at
//! minute resolution. When the end lies before the start the window wraps past
//! midnight and covers `[from, 24:00) ∪ [00:00, to)`.
//!
//! # Examples
//!
//! ```rust
//! use override_engine::TimeWindow;
//!
//! let night = TimeWindow::new(22.0, 2.0)?;
//! assert!(night.wraps_midnight());
//! assert!(night.contains(23 * 60));
//! assert!(night.contains(60));
//! assert!(!night.contains(12 * 60));
//! # Ok::<(), override_engine::EngineError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};

/// Index of a minute within a calendar day, `0..1440`.
pub type MinuteOfDay = u16;

/// Number of minutes in a calendar day.
pub const MINUTES_PER_DAY: usize = 1440;

// Absorbs binary float error in decimal hours such as 1.15 (69 minutes).
const HOUR_TOLERANCE: f64 = 1e-9;

/// A recurring time-of-day interval, start inclusive, end exclusive.
///
/// Constructed from decimal hours (`6.5` is 06:30) or exact minutes. Hours must
/// lie in `[0, 24)`; anything else is rejected rather than clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeWindow", into = "RawTimeWindow")]
pub struct TimeWindow {
    from_minute: MinuteOfDay,
    to_minute: MinuteOfDay,
}

impl TimeWindow {
    /// Creates a window from decimal hours.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidRule` if either hour is not finite or lies
    /// outside `[0, 24)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use override_engine::TimeWindow;
    ///
    /// let morning = TimeWindow::new(6.0, 9.0)?;
    /// assert_eq!(morning.from_minute(), 360);
    /// assert_eq!(morning.to_minute(), 540);
    ///
    /// assert!(TimeWindow::new(25.0, 2.0).is_err());
    /// # Ok::<(), override_engine::EngineError>(())
    /// ```
    pub fn new(from_hour: f64, to_hour: f64) -> EngineResult<Self> {
        Ok(Self {
            from_minute: hour_to_minute("from_hour", from_hour)?,
            to_minute: hour_to_minute("to_hour", to_hour)?,
        })
    }

    /// Creates a window from exact minutes of the day.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidRule` if either minute is 1440 or larger.
    pub fn from_minutes(from_minute: MinuteOfDay, to_minute: MinuteOfDay) -> EngineResult<Self> {
        for (field, minute) in [("from_minute", from_minute), ("to_minute", to_minute)] {
            if usize::from(minute) >= MINUTES_PER_DAY {
                return Err(EngineError::invalid_rule(
                    field,
                    format!("{} is outside 0..{}", minute, MINUTES_PER_DAY),
                ));
            }
        }
        Ok(Self {
            from_minute,
            to_minute,
        })
    }

    /// Parses a window from two `HH:MM` clock strings.
    ///
    /// ```rust
    /// use override_engine::TimeWindow;
    ///
    /// let window = TimeWindow::parse_clock("22:30", "06:00")?;
    /// assert_eq!(window.from_minute(), 1350);
    /// assert!(window.wraps_midnight());
    /// # Ok::<(), override_engine::EngineError>(())
    /// ```
    pub fn parse_clock(from: &str, to: &str) -> EngineResult<Self> {
        Self::from_minutes(parse_clock_minute("from", from)?, parse_clock_minute("to", to)?)
    }

    /// First minute covered by the window.
    pub fn from_minute(&self) -> MinuteOfDay {
        self.from_minute
    }

    /// Minute at which the window ends (exclusive).
    pub fn to_minute(&self) -> MinuteOfDay {
        self.to_minute
    }

    /// Window start as decimal hours.
    pub fn from_hour(&self) -> f64 {
        f64::from(self.from_minute) / 60.0
    }

    /// Window end as decimal hours.
    pub fn to_hour(&self) -> f64 {
        f64::from(self.to_minute) / 60.0
    }

    /// Whether the window crosses midnight.
    pub fn wraps_midnight(&self) -> bool {
        self.to_minute < self.from_minute
    }

    /// Whether the window covers no minute at all (`from == to`).
    pub fn is_empty(&self) -> bool {
        self.to_minute == self.from_minute
    }

    /// Checks whether `minute` (0..1440) falls inside the window.
    pub fn contains(&self, minute: MinuteOfDay) -> bool {
        if self.wraps_midnight() {
            minute >= self.from_minute || minute < self.to_minute
        } else {
            self.from_minute <= minute && minute < self.to_minute
        }
    }

    /// Splits the window into at most two non-wrapping half-open minute ranges.
    ///
    /// A wrapping window yields `[from, 1440)` followed by `[0, to)`; empty
    /// pieces are omitted.
    pub fn ranges(&self) -> Vec<(MinuteOfDay, MinuteOfDay)> {
        if self.wraps_midnight() {
            let mut ranges = vec![(self.from_minute, MINUTES_PER_DAY as MinuteOfDay)];
            if self.to_minute > 0 {
                ranges.push((0, self.to_minute));
            }
            ranges
        } else if self.is_empty() {
            Vec::new()
        } else {
            vec![(self.from_minute, self.to_minute)]
        }
    }

    /// Number of minutes the window covers in one day.
    pub fn len_minutes(&self) -> usize {
        self.ranges()
            .iter()
            .map(|(start, end)| usize::from(end - start))
            .sum()
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}",
            format_minute(usize::from(self.from_minute)),
            format_minute(usize::from(self.to_minute))
        )
    }
}

/// Serialized form of a [`TimeWindow`]: decimal hours.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawTimeWindow {
    from_hour: f64,
    to_hour: f64,
}

impl TryFrom<RawTimeWindow> for TimeWindow {
    type Error = EngineError;

    fn try_from(raw: RawTimeWindow) -> Result<Self, Self::Error> {
        TimeWindow::new(raw.from_hour, raw.to_hour)
    }
}

impl From<TimeWindow> for RawTimeWindow {
    fn from(window: TimeWindow) -> Self {
        RawTimeWindow {
            from_hour: window.from_hour(),
            to_hour: window.to_hour(),
        }
    }
}

/// Renders a minute offset as `HH:MM`. Minute 1440 renders as `24:00`.
///
/// ```rust
/// use override_engine::format_minute;
///
/// assert_eq!(format_minute(0), "00:00");
/// assert_eq!(format_minute(545), "09:05");
/// assert_eq!(format_minute(1440), "24:00");
/// ```
pub fn format_minute(minute: usize) -> String {
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

fn hour_to_minute(field: &str, hour: f64) -> EngineResult<MinuteOfDay> {
    if !hour.is_finite() || !(0.0..24.0).contains(&hour) {
        return Err(EngineError::invalid_rule(
            field,
            format!("{} is outside [0, 24)", hour),
        ));
    }
    let minute = (hour * 60.0 + HOUR_TOLERANCE).floor();
    // 23.99999999999 can still round up to 1440 through the tolerance
    Ok((minute as MinuteOfDay).min(MINUTES_PER_DAY as MinuteOfDay - 1))
}

fn parse_clock_minute(field: &str, text: &str) -> EngineResult<MinuteOfDay> {
    let invalid = || EngineError::invalid_rule(field, format!("'{}' is not a HH:MM time", text));

    let (hours, minutes) = text.trim().split_once(':').ok_or_else(invalid)?;
    let hours: MinuteOfDay = hours.parse().map_err(|_| invalid())?;
    let minutes: MinuteOfDay = minutes.parse().map_err(|_| invalid())?;
    if hours >= 24 || minutes >= 60 {
        return Err(invalid());
    }
    Ok(hours * 60 + minutes)
}

#[cfg(test)]
#[path = "time_window_tests.rs"]
mod tests;
