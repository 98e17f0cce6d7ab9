//! Error types for capture analysis.
//!
//! Every failure the analyzer can hit is an [`AnalysisError`]. Most of them are
//! local to a single record: they are reported into a
//! [`Diagnostics`](crate::Diagnostics) channel and the run continues. Only the
//! source and output failures abort a run.
//!
//! ## Error Categories
//!
//! - **Record Errors**: an input row or packet that cannot be parsed
//! - **Session Errors**: per-session state could not be set up
//! - **Input Errors**: an empty or unreadable input source
//! - **Output Errors**: a log or result file could not be written
//! - **Config Errors**: the analyzer configuration could not be loaded
//! - **Worker Errors**: a parallel scoring task panicked or was cancelled
//!
//! ## Fatal vs. recoverable
//!
//! ```rust
//! use rtp_playout::AnalysisError;
//!
//! let error = AnalysisError::malformed(12, "expected 22 fields, found 3");
//! assert!(!error.is_fatal());
//! assert_eq!(error.position(), Some(12));
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for analysis operations.
pub type Result<T, E = AnalysisError> = std::result::Result<T, E>;

/// Main error type for analysis operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AnalysisError {
    #[error("Malformed record at line {line}: {details}")]
    MalformedRecord { line: u64, details: String },

    #[error("Failed to set up session {key}: {reason}")]
    SessionSetup { key: String, reason: String },

    #[error("No valid records in {source_name}")]
    EmptyInput { source_name: String },

    #[error("Cannot read input source: {path}")]
    UnreadableSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed writing {context}")]
    Output {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {details}")]
    Config { details: String },

    #[error("Scoring worker failed: {details}")]
    Worker { details: String },
}

impl AnalysisError {
    /// Returns whether this error must abort the run.
    pub fn is_fatal(&self) -> bool {
        match self {
            AnalysisError::MalformedRecord { .. } => false,
            AnalysisError::SessionSetup { .. } => false,
            AnalysisError::EmptyInput { .. } => false,
            AnalysisError::UnreadableSource { .. } => true,
            AnalysisError::Output { .. } => true,
            AnalysisError::Config { .. } => true,
            AnalysisError::Worker { .. } => true,
        }
    }

    /// Line or packet index the error refers to, when it has one.
    pub fn position(&self) -> Option<u64> {
        match self {
            AnalysisError::MalformedRecord { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            AnalysisError::MalformedRecord { .. } => vec![
                "Check the column count of the reported line",
                "Verify the file was produced by the same analyzer version",
            ],
            AnalysisError::SessionSetup { .. } => vec![
                "Check the accumulator factory for the session's media type",
                "Inspect the first packet of the reported session",
            ],
            AnalysisError::EmptyInput { .. } => vec![
                "Verify the capture contains RTP video traffic",
                "Check the normalization media tag in the configuration",
            ],
            AnalysisError::UnreadableSource { .. } => vec![
                "Check file exists and is readable",
                "Check file permissions",
            ],
            AnalysisError::Output { .. } => vec![
                "Ensure sufficient disk space",
                "Check the output directory is writable",
            ],
            AnalysisError::Config { .. } => vec![
                "Check the YAML syntax of the configuration file",
                "Remove unknown keys from the configuration",
            ],
            AnalysisError::Worker { .. } => vec![
                "Re-run without --parallel to isolate the failing group",
            ],
        }
    }

    /// Helper constructor for malformed input records.
    pub fn malformed(line: u64, details: impl Into<String>) -> Self {
        AnalysisError::MalformedRecord { line, details: details.into() }
    }

    /// Helper constructor for session setup failures.
    pub fn session_setup(key: impl Into<String>, reason: impl Into<String>) -> Self {
        AnalysisError::SessionSetup { key: key.into(), reason: reason.into() }
    }

    /// Helper constructor for empty inputs.
    pub fn empty_input(source_name: impl Into<String>) -> Self {
        AnalysisError::EmptyInput { source_name: source_name.into() }
    }

    /// Helper constructor for unreadable sources with path context.
    pub fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnalysisError::UnreadableSource { path: path.into(), source }
    }

    /// Helper constructor for output failures.
    pub fn output(context: impl Into<String>, source: std::io::Error) -> Self {
        AnalysisError::Output { context: context.into(), source }
    }

    /// Helper constructor for configuration errors.
    pub fn config(details: impl Into<String>) -> Self {
        AnalysisError::Config { details: details.into() }
    }

    /// Helper constructor for failed scoring workers.
    pub fn worker(details: impl Into<String>) -> Self {
        AnalysisError::Worker { details: details.into() }
    }
}

impl From<serde_yaml_ng::Error> for AnalysisError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        AnalysisError::Config { details: err.to_string() }
    }
}
