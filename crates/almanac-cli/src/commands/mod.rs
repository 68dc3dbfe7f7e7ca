pub mod agenda;
pub mod check;
pub mod day;

use almanac_core::config::ExpansionConfig;
use almanac_core::diagnostics::RecordingSink;
use almanac_core::models::{EventDefinition, EventRecord};
use almanac_core::recurrence::RecurrenceExpander;
use anyhow::{bail, Context, Result};
use owo_colors::OwoColorize;
use std::path::Path;
use std::sync::Arc;

pub fn read_records(path: &Path) -> Result<Vec<EventRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("'{}' is not a JSON array of event records", path.display()))
}

pub fn load_definitions(path: &Path, config: &ExpansionConfig) -> Result<Vec<EventDefinition>> {
    let records = read_records(path)?;
    tracing::debug!(records = records.len(), path = %path.display(), "loaded export");
    records
        .into_iter()
        .map(|record| {
            let id = record.id.clone();
            record
                .into_definition(config)
                .with_context(|| format!("Invalid record '{}'", id))
        })
        .collect()
}

/// Expander whose diagnostics are collected for `report_diagnostics`.
pub fn recording_expander(config: &ExpansionConfig) -> (RecurrenceExpander, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    (RecurrenceExpander::new(config.clone(), sink.clone()), sink)
}

/// Prints collected diagnostics as warnings; in strict mode any diagnostic is an error.
pub fn report_diagnostics(sink: &RecordingSink, strict: bool) -> Result<()> {
    let reports = sink.reports();
    for (id, error) in &reports {
        eprintln!("{} {}: {}", "Warning:".yellow().bold(), id, error);
    }
    if strict && !reports.is_empty() {
        bail!("{} recurrence problem(s) found in strict mode", reports.len());
    }
    Ok(())
}
