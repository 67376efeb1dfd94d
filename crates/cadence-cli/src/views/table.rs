use cadence_core::models::{Task, TaskStatus};
use chrono::Utc;
use chrono_humanize::Humanize;
use comfy_table::{Attribute, Cell, Color, Row, Table};

pub fn display_tasks(tasks: &[&Task]) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Status", "Starts", "Checklist"]);

    for task in tasks {
        let mut row = Row::new();
        row.add_cell(Cell::new(&task.id.to_string()[..8]));

        let mut display_title = String::new();
        if task.is_series_member() {
            display_title.push('↻'); // Recurring symbol
            display_title.push(' ');
        }
        display_title.push_str(&task.title);
        if task.is_important {
            display_title.push_str(" !");
        }

        let mut title_cell = Cell::new(display_title);
        match task.status {
            TaskStatus::Done => {
                title_cell = title_cell
                    .add_attribute(Attribute::CrossedOut)
                    .fg(Color::DarkGrey);
            }
            TaskStatus::InProgress => {
                title_cell = title_cell.fg(Color::Yellow);
            }
            TaskStatus::ToDo => {
                if task.is_important {
                    title_cell = title_cell.fg(Color::Red).add_attribute(Attribute::Bold);
                }
            }
        };
        row.add_cell(title_cell);

        let mut status_cell = Cell::new(task.status.to_string());
        status_cell = match task.status {
            TaskStatus::Done => status_cell.fg(Color::Green),
            TaskStatus::InProgress => status_cell.fg(Color::Yellow),
            TaskStatus::ToDo => status_cell,
        };
        row.add_cell(status_cell);

        let now = Utc::now();
        let starts_text = task.start_time.humanize();
        let starts_cell = if task.status != TaskStatus::Done {
            if task.end_time < now {
                Cell::new(starts_text).fg(Color::Red) // Overdue
            } else if task.start_time.date_naive() == now.date_naive() {
                Cell::new(starts_text).fg(Color::Yellow) // Starts today
            } else {
                Cell::new(starts_text)
            }
        } else {
            Cell::new(starts_text)
        };
        row.add_cell(starts_cell);

        row.add_cell(checklist_cell(task));

        table.add_row(row);
    }

    println!("{table}");
}

fn checklist_cell(task: &Task) -> Cell {
    if task.checklist.is_empty() {
        return Cell::new("-");
    }
    let ticked = task.checklist.iter().filter(|item| item.completed).count();
    let cell = Cell::new(format!("{}/{}", ticked, task.checklist.len()));
    if ticked == task.checklist.len() {
        cell.fg(Color::Green)
    } else {
        cell
    }
}
