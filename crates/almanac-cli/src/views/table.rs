use almanac_core::layout::DayLayout;
use almanac_core::models::Occurrence;
use comfy_table::{Attribute, Cell, Color, Row, Table};

#[derive(Debug, Clone)]
pub struct Problem {
    pub id: String,
    pub message: String,
}

fn time_cell(occurrence: &Occurrence) -> Cell {
    match occurrence.span {
        Some(span) => Cell::new(span.to_string()),
        None => Cell::new("all day").fg(Color::DarkGrey),
    }
}

fn title_cell(occurrence: &Occurrence) -> Cell {
    let mut name = String::new();
    if occurrence.is_virtual {
        name.push_str("↻ ");
    }
    name.push_str(occurrence.title.as_deref().unwrap_or(&occurrence.source_id));

    let cell = Cell::new(name);
    if occurrence.completed {
        cell.add_attribute(Attribute::CrossedOut).fg(Color::DarkGrey)
    } else {
        cell
    }
}

pub fn display_agenda(occurrences: &[Occurrence]) {
    if occurrences.is_empty() {
        println!("No occurrences found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Date", "Time", "Title", "ID", "Done"]);

    for occurrence in occurrences {
        let mut row = Row::new();
        row.add_cell(Cell::new(occurrence.date.format("%a %Y-%m-%d").to_string()));
        row.add_cell(time_cell(occurrence));
        row.add_cell(title_cell(occurrence));
        row.add_cell(Cell::new(&occurrence.occurrence_id));
        row.add_cell(if occurrence.completed {
            Cell::new("✓").fg(Color::Green)
        } else {
            Cell::new("")
        });
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_day(layout: &DayLayout) {
    println!(
        "{} ({} column{})",
        layout.date.format("%A %Y-%m-%d"),
        layout.column_count,
        if layout.column_count == 1 { "" } else { "s" }
    );

    if layout.all_day.is_empty() && layout.timed.is_empty() {
        println!("Nothing scheduled.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Time", "Column", "Width", "Title", "ID"]);

    for occurrence in &layout.all_day {
        let mut row = Row::new();
        row.add_cell(time_cell(occurrence));
        row.add_cell(Cell::new("-"));
        row.add_cell(Cell::new("-"));
        row.add_cell(title_cell(occurrence));
        row.add_cell(Cell::new(&occurrence.occurrence_id));
        table.add_row(row);
    }

    for event in &layout.timed {
        let mut row = Row::new();
        row.add_cell(time_cell(&event.occurrence));
        row.add_cell(Cell::new(event.column_index));
        row.add_cell(Cell::new(format!("1/{}", event.overlap_group_size)));
        row.add_cell(title_cell(&event.occurrence));
        row.add_cell(Cell::new(&event.occurrence.occurrence_id));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_problems(problems: &[Problem]) {
    let mut table = Table::new();
    table.set_header(vec!["Record", "Problem"]);
    for problem in problems {
        let mut row = Row::new();
        row.add_cell(Cell::new(&problem.id).fg(Color::Yellow));
        row.add_cell(Cell::new(&problem.message).fg(Color::Red));
        table.add_row(row);
    }
    println!("{table}");
}
