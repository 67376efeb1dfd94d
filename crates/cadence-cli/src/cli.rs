use clap::{Parser, Subcommand};

/// Cadence: a task manager where recurring work schedules itself
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Add a new task
    Add(AddCommand),
    /// List tasks
    List(ListCommand),
    /// Delete a task; deleting a recurring task retires its series
    Delete(DeleteCommand),
    /// Mark a task as done
    Do(DoCommand),
    /// Edit a task
    Edit(EditCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    /// The title of the task
    pub title: String,
    /// Notes attached to the task
    #[clap(short, long)]
    pub notes: Option<String>,
    /// When the task starts, in plain English (e.g. 'tomorrow 9am')
    #[clap(short, long)]
    pub start: Option<String>,
    /// When the task ends; defaults to one hour after the start
    #[clap(short, long)]
    pub end: Option<String>,
    /// Flag the task as important
    #[clap(short, long)]
    pub important: bool,
    /// How the task repeats (daily, weekdays, weekly, monthly, yearly)
    #[clap(long)]
    pub every: Option<String>,
    /// Checklist items to attach to the task
    #[clap(long = "item", num_args = 1..)]
    pub item: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    /// Which tasks to show: all, open, done, today or important
    pub filter: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteCommand {
    /// The ID of the task to delete; a unique prefix is enough
    pub id: String,
    /// Skip the confirmation prompt
    #[clap(short, long)]
    pub force: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct DoCommand {
    /// The ID of the task to complete; a unique prefix is enough
    pub id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct EditCommand {
    /// The ID of the task to edit; a unique prefix is enough
    pub id: String,
    /// New title for the task
    #[clap(long)]
    pub title: Option<String>,
    /// New notes for the task
    #[clap(long)]
    pub notes: Option<String>,
    /// Remove the notes from the task
    #[clap(long, conflicts_with = "notes")]
    pub notes_clear: bool,
    /// New start time, in plain English
    #[clap(long)]
    pub start: Option<String>,
    /// New end time, in plain English
    #[clap(long)]
    pub end: Option<String>,
    /// New status (todo, in_progress, done); completing a recurring task
    /// schedules its next occurrence
    #[clap(long)]
    pub status: Option<String>,
    /// Mark or unmark the task as important
    #[clap(long)]
    pub important: Option<bool>,
    /// Change how the task repeats; 'none' stops future occurrences
    #[clap(long)]
    pub every: Option<String>,
    /// Replace the checklist with the given items
    #[clap(long = "item", num_args = 1..)]
    pub item: Vec<String>,
}
