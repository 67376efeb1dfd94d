use anyhow::{anyhow, Result};
use cadence_core::error::CoreError;
use cadence_core::manager::TaskManager;
use cadence_core::models::{
    ChecklistItem, Recurrence, TaskPatch, TaskStatus, TransitionOutcome,
};
use cadence_core::store::TaskStore;

use crate::cli::EditCommand;
use crate::parser::parse_moment;
use crate::util::resolve_task_id;

pub async fn edit_task(manager: &TaskManager<impl TaskStore>, command: EditCommand) -> Result<()> {
    let task_id = resolve_task_id(manager, &command.id)?;
    let status = command
        .status
        .as_deref()
        .map(str::parse::<TaskStatus>)
        .transpose()?;
    let patch = build_patch(&command)?;

    // A status change may complete a recurring task, which has to spawn the
    // next occurrence in the same step. Route those through the transition
    // path; plain field edits take the lighter patch path.
    if let Some(status) = status {
        let mut replacement = manager
            .get_by_id(task_id)
            .ok_or_else(|| anyhow!(CoreError::NotFound(task_id)))?;
        patch.apply(&mut replacement);
        replacement.status = status;

        match manager.update_with_transition(replacement).await? {
            TransitionOutcome::Updated(task) => {
                println!("Updated task: '{}'", task.title);
            }
            TransitionOutcome::Advanced { completed, next } => {
                println!("Completed task: '{}'", completed.title);
                println!(
                    "Created recurring task '{}' for {}",
                    next.title,
                    next.start_time.to_rfc2822()
                );
            }
        }
        return Ok(());
    }

    if patch.is_empty() {
        return Err(anyhow!("Nothing to change; pass at least one field"));
    }

    manager.update(task_id, patch).await?;
    println!("Updated task with ID: {}", task_id);

    Ok(())
}

fn build_patch(command: &EditCommand) -> Result<TaskPatch> {
    let notes = if command.notes_clear {
        Some(None)
    } else {
        command.notes.clone().map(Some)
    };

    let start_time = command.start.as_deref().map(parse_moment).transpose()?;
    let end_time = command.end.as_deref().map(parse_moment).transpose()?;
    let recurrence = command
        .every
        .as_deref()
        .map(str::parse::<Recurrence>)
        .transpose()?;
    let checklist = if command.item.is_empty() {
        None
    } else {
        Some(
            command
                .item
                .iter()
                .map(|text| ChecklistItem::new(text.clone()))
                .collect(),
        )
    };

    Ok(TaskPatch {
        title: command.title.clone(),
        notes,
        start_time,
        end_time,
        status: None,
        checklist,
        is_important: command.important,
        recurrence,
        recurring_template_id: None,
    })
}
