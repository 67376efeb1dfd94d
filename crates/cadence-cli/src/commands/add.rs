use anyhow::Result;
use cadence_core::manager::TaskManager;
use cadence_core::models::{ChecklistItem, Recurrence, TaskDraft, TaskStatus};
use cadence_core::store::TaskStore;
use chrono::{Duration, Utc};
use owo_colors::{OwoColorize, Style};

use crate::cli::AddCommand;
use crate::parser::parse_moment;

pub async fn add_task(manager: &TaskManager<impl TaskStore>, command: AddCommand) -> Result<()> {
    let start_time = command
        .start
        .as_deref()
        .map(parse_moment)
        .transpose()?
        .unwrap_or_else(Utc::now);
    let end_time = command
        .end
        .as_deref()
        .map(parse_moment)
        .transpose()?
        .unwrap_or_else(|| start_time + Duration::hours(1));
    if end_time < start_time {
        return Err(anyhow::anyhow!(
            "End time {} is before start time {}",
            end_time.to_rfc2822(),
            start_time.to_rfc2822()
        ));
    }

    let recurrence = command
        .every
        .as_deref()
        .map(str::parse::<Recurrence>)
        .transpose()?
        .unwrap_or(Recurrence::None);
    let checklist = command
        .item
        .iter()
        .map(|text| ChecklistItem::new(text.clone()))
        .collect();

    let draft = TaskDraft {
        title: command.title,
        notes: command.notes,
        start_time,
        end_time,
        status: TaskStatus::ToDo,
        checklist,
        is_important: command.important,
        recurrence,
        recurring_template_id: None,
    };

    let added = manager.add(draft).await?;

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();

    if added.recurrence.is_recurring() {
        println!(
            "{} Created recurring task: {}",
            "✓".style(success_style),
            added.title.bright_white().bold()
        );
        println!(
            "  {} Task ID: {}",
            "→".style(info_style),
            added.id.to_string().yellow()
        );
        println!(
            "  {} Repeats {}; completing it schedules the next occurrence",
            "→".style(info_style),
            added.recurrence
        );
    } else {
        println!(
            "{} Created task: {}",
            "✓".style(success_style),
            added.title.bright_white().bold()
        );
        println!(
            "  {} Task ID: {}",
            "→".style(info_style),
            added.id.to_string().yellow()
        );
    }
    println!(
        "  {} Starts: {}",
        "→".style(info_style),
        added.start_time.to_rfc2822().cyan()
    );

    Ok(())
}
