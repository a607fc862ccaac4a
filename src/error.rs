//! Error types for chordtime

use thiserror::Error;

/// Errors raised while building a target combination
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("combination size must be at least 1")]
    EmptyCombination,

    #[error("combination of {size} keys needs {letters} distinct letters but only {available} exist")]
    AlphabetExhausted {
        size: usize,
        letters: usize,
        available: usize,
    },
}

/// Errors raised while validating experiment settings
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("trial count must be at least 1")]
    NoTrials,

    #[error("invalid maximum combination size: {0}")]
    InvalidComboSize(#[from] GenerateError),
}

/// Errors raised by the session state machine
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session has already been started")]
    AlreadyStarted,

    #[error("cannot report a session with no completed trials")]
    NoTrialsCompleted,

    #[error("failed to generate trial: {0}")]
    Generate(#[from] GenerateError),
}

/// Errors raised while writing result rows
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors raised by the offline analysis
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {line} has {found} columns, expected 5 or 6")]
    ColumnCount { line: u64, found: usize },

    #[error("no result rows found")]
    NoRows,
}
