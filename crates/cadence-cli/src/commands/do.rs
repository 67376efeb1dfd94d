use anyhow::{anyhow, Result};
use cadence_core::error::CoreError;
use cadence_core::manager::TaskManager;
use cadence_core::models::{TaskStatus, TransitionOutcome};
use cadence_core::store::TaskStore;

use crate::cli::DoCommand;
use crate::util::resolve_task_id;

pub async fn do_task(manager: &TaskManager<impl TaskStore>, command: DoCommand) -> Result<()> {
    let task_id = resolve_task_id(manager, &command.id)?;
    let mut task = manager
        .get_by_id(task_id)
        .ok_or_else(|| anyhow!(CoreError::NotFound(task_id)))?;
    task.status = TaskStatus::Done;

    match manager.update_with_transition(task).await? {
        TransitionOutcome::Updated(task) => {
            println!("Completed task: '{}'", task.title);
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

    Ok(())
}
