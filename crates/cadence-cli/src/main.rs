use cadence_core::error::CoreError;
use cadence_core::manager::TaskManager;
use cadence_core::store::SqliteStore;
use clap::Parser;
use dialoguer::Confirm;
use owo_colors::{OwoColorize, Style};
use tracing_subscriber::EnvFilter;
use util::resolve_task_id;

mod cli;
mod commands;
mod config;
mod parser;
mod util;
mod views;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();
    let config = config::Config::new().unwrap_or_default();

    let store = match SqliteStore::connect(&config.database).await {
        Ok(store) => store,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };
    let manager = TaskManager::new(store);

    // Every command works against the owner's loaded task list.
    if let Err(e) = manager.fetch_all(config.owner_id()).await {
        handle_error(e.into());
        std::process::exit(1);
    }

    let result = match cli.command {
        cli::Commands::Add(command) => commands::add::add_task(&manager, command).await,
        cli::Commands::List(command) => commands::list::list_tasks(&manager, command, &config),
        cli::Commands::Delete(command) => {
            let task_id = match resolve_task_id(&manager, &command.id) {
                Ok(id) => id,
                Err(e) => {
                    handle_error(e);
                    std::process::exit(1);
                }
            };
            let task = match manager.get_by_id(task_id) {
                Some(task) => task,
                None => {
                    let error_style = Style::new().red().bold();
                    eprintln!(
                        "{} Task with ID '{}' not found.",
                        "Error:".style(error_style),
                        task_id
                    );
                    std::process::exit(1);
                }
            };

            if !command.force {
                // A still-recurring task is deleted as a whole series;
                // anything else, terminated occurrences included, goes alone.
                let prompt = if task.recurrence.is_recurring() {
                    format!(
                        "'{}' repeats. Deleting it retires the whole series; finished occurrences are kept. Continue?",
                        task.title
                    )
                } else {
                    format!("Are you sure you want to delete task '{}'?", task.title)
                };
                let confirmation = Confirm::new()
                    .with_prompt(prompt)
                    .default(false)
                    .interact()
                    .unwrap_or(false);

                if !confirmation {
                    println!("Deletion cancelled.");
                    return;
                }
            }

            commands::delete::delete_task(&manager, task_id).await
        }
        cli::Commands::Do(command) => commands::r#do::do_task(&manager, command).await,
        cli::Commands::Edit(command) => commands::edit::edit_task(&manager, command).await,
    };

    if let Err(e) = result {
        handle_error(e);
        std::process::exit(1);
    }
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    // The interesting errors may sit behind anyhow context, so scan the chain.
    let core_error = err.chain().find_map(|e| e.downcast_ref::<CoreError>());

    match core_error {
        Some(CoreError::NotFound(id)) => {
            eprintln!(
                "{} Task with ID '{}' not found.",
                "Error:".style(error_style),
                id.yellow()
            );
        }
        Some(CoreError::AmbiguousId(matches)) => {
            eprintln!("{}", "Error: Ambiguous ID.".style(error_style));
            eprintln!("Did you mean one of these?");
            for (id, title) in matches {
                eprintln!("  {} ({})", id.yellow(), title);
            }
        }
        Some(CoreError::NoOwner) => {
            eprintln!(
                "{} No owner is bound to this database.",
                "Error:".style(error_style)
            );
            eprintln!("Set `owner` in cadence.toml or the CADENCE_OWNER environment variable.");
        }
        Some(CoreError::InvalidInput(message)) => {
            eprintln!("{} {}", "Error:".style(error_style), message);
        }
        _ => {
            eprintln!("{} {:#}", "Error:".style(error_style), err);
        }
    }
}
