use anyhow::Result;
use cadence_core::manager::TaskManager;
use cadence_core::models::{Task, TaskStatus};
use cadence_core::store::TaskStore;
use chrono::Utc;

use crate::cli::ListCommand;
use crate::config::Config;
use crate::views::table::display_tasks;

pub fn list_tasks(
    manager: &TaskManager<impl TaskStore>,
    command: ListCommand,
    config: &Config,
) -> Result<()> {
    let filter = command
        .filter
        .or_else(|| config.default_filter.clone())
        .unwrap_or_else(|| "open".to_string());

    let tasks = manager.tasks();
    let selected: Vec<&Task> = match filter.as_str() {
        "all" => tasks.iter().collect(),
        "open" => tasks
            .iter()
            .filter(|task| task.status != TaskStatus::Done)
            .collect(),
        "done" => tasks
            .iter()
            .filter(|task| task.status == TaskStatus::Done)
            .collect(),
        "today" => {
            let today = Utc::now().date_naive();
            tasks
                .iter()
                .filter(|task| task.start_time.date_naive() == today)
                .collect()
        }
        "important" => tasks.iter().filter(|task| task.is_important).collect(),
        other => {
            return Err(anyhow::anyhow!(
                "Unknown filter '{}'. Available filters: all, open, done, today, important",
                other
            ))
        }
    };

    display_tasks(&selected);

    Ok(())
}
