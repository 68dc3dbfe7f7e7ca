use almanac_core::models::DateWindow;
use anyhow::Result;
use chrono::{DateTime, Days};
use chrono_tz::Tz;

use super::{load_definitions, recording_expander, report_diagnostics};
use crate::cli::AgendaCommand;
use crate::config::Config;
use crate::parser::parse_date;
use crate::views::table::display_agenda;

pub fn show_agenda(command: AgendaCommand, config: &Config, now: DateTime<Tz>) -> Result<()> {
    let start = match &command.from {
        Some(from) => parse_date(from, now)?,
        None => now.date_naive(),
    };
    let end = match &command.to {
        Some(to) => parse_date(to, now)?,
        None => start + Days::new(u64::from(config.lookahead_days)),
    };
    let window = DateWindow::new(start, end)?;

    let definitions = load_definitions(&command.export.file, &config.expansion)?;
    let (expander, sink) = recording_expander(&config.expansion);
    let occurrences = expander.expand(&definitions, window);

    if command.export.json {
        println!("{}", serde_json::to_string_pretty(&occurrences)?);
    } else {
        display_agenda(&occurrences);
    }

    report_diagnostics(&sink, command.export.strict)
}
