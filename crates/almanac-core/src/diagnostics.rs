use std::sync::{Mutex, PoisonError};

use crate::error::RecurrenceError;

/// Receives problems that expansion recovers from locally.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, definition_id: &str, error: &RecurrenceError);
}

/// Default sink: emits a `tracing` warning per report.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, definition_id: &str, error: &RecurrenceError) {
        tracing::warn!(definition_id, %error, "recurrence expansion degraded");
    }
}

/// Collects reports in memory so callers can inspect them after a call.
#[derive(Debug, Default)]
pub struct RecordingSink {
    reports: Mutex<Vec<(String, RecurrenceError)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<(String, RecurrenceError)> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, definition_id: &str, error: &RecurrenceError) {
        tracing::debug!(definition_id, %error, "recording expansion diagnostic");
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((definition_id.to_string(), error.clone()));
    }
}
