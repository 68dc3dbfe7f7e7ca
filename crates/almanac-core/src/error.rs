use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid event record")]
    Definition(#[from] DefinitionError),

    #[error("Invalid date window: {start} is after {end}")]
    InvalidWindow { start: chrono::NaiveDate, end: chrono::NaiveDate },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Raised while normalizing a persisted record into an `EventDefinition`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("Event record has an empty id")]
    EmptyId,

    #[error("Invalid date '{value}' in field '{field}'")]
    InvalidDate { field: &'static str, value: String },

    #[error("Invalid time of day '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("Invalid weekday ordinal {0}, expected 0 (Sunday) through 6 (Saturday)")]
    InvalidWeekday(u8),
}

/// Problems met while expanding a single definition. These never leave
/// `expand`; they go to the configured diagnostic sink instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    #[error("Failed to parse RRULE '{rule}': {reason}")]
    RuleParse { rule: String, reason: String },

    #[error("Expansion stopped after {limit} occurrences")]
    TooManyOccurrences { limit: usize },
}
