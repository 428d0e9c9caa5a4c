//! Argument parsing shared by the commands.

use chrono::{NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use serde::Serialize;

use crate::errors::Error;

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(text: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|e| {
        Error::InvalidArguments(format!("'{}' is not a YYYY-MM-DD date: {}", text, e))
    })
}

/// Parses a local date-time written as `YYYY-MM-DDTHH:MM[:SS]` or with a space
/// instead of the `T`.
pub fn parse_date_time(text: &str) -> Result<NaiveDateTime, Error> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    let text = text.trim();
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .ok_or_else(|| {
            Error::InvalidArguments(format!("'{}' is not a YYYY-MM-DDTHH:MM date-time", text))
        })
}

/// Serializes a command result as pretty JSON.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, Error> {
    serde_json::to_string_pretty(value).map_err(|e| Error::Output(e.to_string()))
}
