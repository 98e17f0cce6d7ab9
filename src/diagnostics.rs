//! Diagnostics channel returned alongside stage results.
//!
//! Per-record failures never cross a stage boundary as `Err`. They are logged
//! and collected here so the caller can inspect or print them after the run.

use tracing::warn;

use crate::AnalysisError;

/// Ordered collection of non-fatal errors reported during a stage.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<AnalysisError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log and keep a diagnostic.
    pub fn report(&mut self, error: AnalysisError) {
        match error.position() {
            Some(position) => warn!(position, "{}", error),
            None => warn!("{}", error),
        }
        self.entries.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnalysisError> {
        self.entries.iter()
    }

    /// Number of malformed records reported.
    pub fn malformed_count(&self) -> usize {
        self.entries.iter().filter(|e| matches!(e, AnalysisError::MalformedRecord { .. })).count()
    }

    /// Number of packets dropped because their session could not be set up.
    pub fn session_failures(&self) -> usize {
        self.entries.iter().filter(|e| matches!(e, AnalysisError::SessionSetup { .. })).count()
    }

    /// Whether an empty input was reported.
    pub fn saw_empty_input(&self) -> bool {
        self.entries.iter().any(|e| matches!(e, AnalysisError::EmptyInput { .. }))
    }

    /// Append another stage's diagnostics, keeping order.
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn into_vec(self) -> Vec<AnalysisError> {
        self.entries
    }
}
