use anyhow::Result;
use cadence_core::manager::TaskManager;
use cadence_core::store::TaskStore;
use uuid::Uuid;

/// Deletes the task with the given id. The confirmation prompt lives with the
/// command dispatch; by this point the decision is made.
pub async fn delete_task(manager: &TaskManager<impl TaskStore>, task_id: Uuid) -> Result<()> {
    manager.delete(task_id).await?;
    println!("Deleted task with ID: {}", task_id);
    Ok(())
}
