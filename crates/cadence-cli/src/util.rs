use anyhow::{anyhow, Result};
use cadence_core::error::CoreError;
use cadence_core::manager::TaskManager;
use cadence_core::store::TaskStore;
use uuid::Uuid;

/// Resolves a short ID prefix against the loaded task list.
pub fn resolve_task_id(manager: &TaskManager<impl TaskStore>, short_id: &str) -> Result<Uuid> {
    if short_id.len() < 2 {
        return Err(anyhow!(CoreError::InvalidInput(
            "Short ID must be at least 2 characters long.".to_string()
        )));
    }
    let needle = short_id.to_lowercase();
    let tasks = manager.tasks();
    let matches: Vec<_> = tasks
        .iter()
        .filter(|task| task.id.to_string().starts_with(&needle))
        .collect();
    if matches.len() == 1 {
        Ok(matches[0].id)
    } else if matches.is_empty() {
        Err(anyhow!("No task found with ID prefix '{}'", short_id))
    } else {
        let candidates: Vec<(Uuid, String)> = matches
            .into_iter()
            .map(|task| (task.id, task.title.clone()))
            .collect();
        Err(anyhow!(CoreError::AmbiguousId(candidates)))
    }
}
