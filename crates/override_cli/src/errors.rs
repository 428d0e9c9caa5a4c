use thiserror::Error;

use override_engine::EngineError;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur in the override-timeline CLI application.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error occurred while loading or parsing configuration.
    ///
    /// This error is returned when the configuration file is missing, cannot be
    /// read, or does not match the expected structure.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid command-line arguments were provided.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The override engine rejected a rule or a query.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Rendering command output failed.
    #[error("Failed to render output: {0}")]
    Output(String),
}
