/// CLI integration tests for cadence
///
/// These tests exercise the binary as a black box against a temporary
/// database, covering the add/list/do/edit/delete flows and the error paths
/// a user is most likely to hit.
use predicates::prelude::*;

mod helpers;
use helpers::{assertions, CliTestHarness};

#[test]
fn test_cli_help_and_version() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&["--help"])
        .stdout(predicate::str::contains("Cadence"))
        .stdout(predicate::str::contains("recurring"));

    harness
        .run_success(&["--version"])
        .stdout(predicate::str::contains("cadence"));

    harness
        .run_failure(&["bogus-command"])
        .stderr(assertions::has_error());
}

#[test]
fn test_add_then_list_shows_task() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&["add", "Groceries", "--item", "milk", "--item", "bread"])
        .stdout(assertions::task_created());

    harness
        .run_success(&["list", "all"])
        .stdout(assertions::has_task_table_headers())
        .stdout(predicate::str::contains("Groceries"))
        .stdout(predicate::str::contains("0/2"));
}

#[test]
fn test_empty_list_prints_placeholder() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&["list", "all"])
        .stdout(predicate::str::contains("No tasks found."));
}

#[test]
fn test_completing_recurring_task_schedules_next() {
    let harness = CliTestHarness::new();
    let id = harness.add_task("Standup", &["--every", "daily"]);

    harness
        .run_success(&["do", id.as_str()])
        .stdout(predicate::str::contains("Completed task: 'Standup'"))
        .stdout(predicate::str::contains("Created recurring task 'Standup'"));

    // Both the finished occurrence and its successor are on the list.
    harness
        .run_success(&["list", "all"])
        .stdout(predicate::str::contains("↻"));
}

#[test]
fn test_completing_plain_task_schedules_nothing() {
    let harness = CliTestHarness::new();
    let id = harness.add_task("One-off errand", &[]);

    harness
        .run_success(&["do", id.as_str()])
        .stdout(predicate::str::contains("Completed task: 'One-off errand'"))
        .stdout(predicate::str::contains("Created recurring task").not());
}

#[test]
fn test_force_delete_removes_task() {
    let harness = CliTestHarness::new();
    let id = harness.add_task("Disposable", &[]);

    harness
        .run_success(&["delete", id.as_str(), "--force"])
        .stdout(predicate::str::contains("Deleted task with ID"));

    harness
        .run_success(&["list", "all"])
        .stdout(predicate::str::contains("No tasks found."));
}

#[test]
fn test_deleting_recurring_task_retires_series() {
    let harness = CliTestHarness::new();
    let id = harness.add_task("Standup", &["--every", "daily"]);
    harness.run_success(&["do", id.as_str()]);

    // Today's finished occurrence is not yet history, so retiring the series
    // sweeps out everything, successor included.
    harness.run_success(&["delete", id.as_str(), "--force"]);

    harness
        .run_success(&["list", "all"])
        .stdout(predicate::str::contains("No tasks found."));
}

#[test]
fn test_delete_without_force_is_cancelled_off_terminal() {
    let harness = CliTestHarness::new();
    let id = harness.add_task("Precious", &[]);

    harness
        .run_success(&["delete", id.as_str()])
        .stdout(predicate::str::contains("Deletion cancelled."));

    harness
        .run_success(&["list", "all"])
        .stdout(predicate::str::contains("Precious"));
}

#[test]
fn test_edit_updates_title() {
    let harness = CliTestHarness::new();
    let id = harness.add_task("Draft report", &[]);

    harness
        .run_success(&["edit", id.as_str(), "--title", "Final report"])
        .stdout(predicate::str::contains("Updated task with ID"));

    harness
        .run_success(&["list", "all"])
        .stdout(predicate::str::contains("Final report"));
}

#[test]
fn test_edit_without_changes_fails() {
    let harness = CliTestHarness::new();
    let id = harness.add_task("Stuck", &[]);

    harness
        .run_failure(&["edit", id.as_str()])
        .stderr(predicate::str::contains("Nothing to change"));
}

#[test]
fn test_edit_status_done_completes_recurring_task() {
    let harness = CliTestHarness::new();
    let id = harness.add_task("Water plants", &["--every", "weekly"]);

    harness
        .run_success(&["edit", id.as_str(), "--status", "done"])
        .stdout(predicate::str::contains("Completed task: 'Water plants'"))
        .stdout(predicate::str::contains("Created recurring task"));
}

#[test]
fn test_list_filters_split_open_and_done() {
    let harness = CliTestHarness::new();
    harness.add_task("Keep busy", &[]);
    let done_id = harness.add_task("Finish me", &[]);
    harness.run_success(&["do", done_id.as_str()]);

    harness
        .run_success(&["list", "open"])
        .stdout(predicate::str::contains("Keep busy"))
        .stdout(predicate::str::contains("Finish me").not());

    harness
        .run_success(&["list", "done"])
        .stdout(predicate::str::contains("Finish me"))
        .stdout(predicate::str::contains("Keep busy").not());
}

#[test]
fn test_list_important_filter() {
    let harness = CliTestHarness::new();
    harness.add_task("Urgent", &["--important"]);
    harness.add_task("Casual", &[]);

    harness
        .run_success(&["list", "important"])
        .stdout(predicate::str::contains("Urgent"))
        .stdout(predicate::str::contains("Casual").not());
}

#[test]
fn test_unknown_filter_fails() {
    let harness = CliTestHarness::new();

    harness
        .run_failure(&["list", "bogus"])
        .stderr(predicate::str::contains("Unknown filter"));
}

#[test]
fn test_unknown_id_prefix_fails() {
    let harness = CliTestHarness::new();

    harness
        .run_failure(&["delete", "deadbeef", "--force"])
        .stderr(predicate::str::contains("No task found"));
}

#[test]
fn test_one_character_prefix_is_rejected() {
    let harness = CliTestHarness::new();
    harness.add_task("Anything", &[]);

    harness
        .run_failure(&["do", "a"])
        .stderr(predicate::str::contains("at least 2 characters"));
}

#[test]
fn test_invalid_start_time_fails() {
    let harness = CliTestHarness::new();

    harness
        .run_failure(&["add", "Bad clock", "--start", "not-a-time"])
        .stderr(predicate::str::contains("Failed to parse time"));
}

#[test]
fn test_invalid_recurrence_fails() {
    let harness = CliTestHarness::new();

    harness
        .run_failure(&["add", "Bad cadence", "--every", "fortnightly"])
        .stderr(predicate::str::contains("Invalid recurrence"));
}
