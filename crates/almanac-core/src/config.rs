use serde::Deserialize;

use crate::error::CoreError;

/// Configuration for occurrence expansion
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    /// Duration applied to records that carry none
    pub default_duration_minutes: u32,
    /// Optional bound on virtual occurrences produced per definition per call.
    /// Unset means every date in the window is produced.
    pub max_occurrences_per_definition: Option<usize>,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            default_duration_minutes: 60,
            max_occurrences_per_definition: None,
        }
    }
}

impl ExpansionConfig {
    /// Rejects configurations that would make every expansion empty.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_occurrences_per_definition == Some(0) {
            return Err(CoreError::InvalidConfig(
                "max_occurrences_per_definition must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
