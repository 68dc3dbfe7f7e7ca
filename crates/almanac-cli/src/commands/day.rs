use almanac_core::layout::layout_day;
use almanac_core::models::DateWindow;
use anyhow::Result;
use chrono::DateTime;
use chrono_tz::Tz;

use super::{load_definitions, recording_expander, report_diagnostics};
use crate::cli::DayCommand;
use crate::config::Config;
use crate::parser::parse_date;
use crate::views::table::display_day;

pub fn show_day(command: DayCommand, config: &Config, now: DateTime<Tz>) -> Result<()> {
    let date = match &command.date {
        Some(date) => parse_date(date, now)?,
        None => now.date_naive(),
    };

    let definitions = load_definitions(&command.export.file, &config.expansion)?;
    let (expander, sink) = recording_expander(&config.expansion);
    let occurrences = expander.expand(&definitions, DateWindow::single_day(date));
    let layout = layout_day(date, &occurrences);

    if command.export.json {
        println!("{}", serde_json::to_string_pretty(&layout)?);
    } else {
        display_day(&layout);
    }

    report_diagnostics(&sink, command.export.strict)
}
