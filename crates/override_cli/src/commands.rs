//! Command modules for the override-timeline CLI.
//!
//! - `args`: shared argument parsing (dates, output format)
//! - `timeline_cmd`: day timelines, forecasts and sampled grids
//! - `query_cmd`: point values, effective values and conditional candidates
//! - `snapshot_cmd`: snapshot validation

pub mod args;
pub mod query_cmd;
pub mod snapshot_cmd;
pub mod timeline_cmd;
