use almanac_core::models::RecurrenceSpec;
use almanac_core::recurrence::RecurrenceExpander;
use anyhow::{bail, Result};

use super::read_records;
use crate::cli::CheckCommand;
use crate::config::Config;
use crate::views::table::{display_problems, Problem};

pub fn check_export(command: CheckCommand, config: &Config) -> Result<()> {
    let records = read_records(&command.file)?;
    let total = records.len();
    let mut problems = Vec::new();

    for (index, record) in records.into_iter().enumerate() {
        let id = if record.id.is_empty() {
            format!("#{}", index)
        } else {
            record.id.clone()
        };

        let definition = match record.into_definition(&config.expansion) {
            Ok(definition) => definition,
            Err(e) => {
                problems.push(Problem { id, message: e.to_string() });
                continue;
            }
        };

        if let RecurrenceSpec::Rule { rule, fallback } = &definition.recurrence {
            if let Err(e) = RecurrenceExpander::validate_rule(rule) {
                let outcome = if fallback.is_some() {
                    "legacy recurrence will be used instead"
                } else {
                    "only the anchor date will be shown"
                };
                problems.push(Problem {
                    id,
                    message: format!("{}; {}", e, outcome),
                });
            }
        }
    }

    if problems.is_empty() {
        println!("All {} record(s) are valid.", total);
        return Ok(());
    }

    display_problems(&problems);
    bail!("{} of {} record(s) have problems", problems.len(), total)
}
