use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test harness for running CLI commands against a throwaway database
pub struct CliTestHarness {
    temp_dir: TempDir,
    db_path: PathBuf,
}

impl CliTestHarness {
    /// Create a new test harness with a temporary database
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");

        Self { temp_dir, db_path }
    }

    /// Get a Command instance wired to the temporary database
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("cadence").expect("Failed to find cadence binary");

        cmd.env("CADENCE_DATABASE", &self.db_path);
        cmd.current_dir(self.temp_dir.path());

        cmd
    }

    /// Helper to run a command and assert success
    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    /// Helper to run a command and assert failure
    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }

    /// Runs `add` with the given extra arguments and returns the new task's id
    pub fn add_task(&self, title: &str, extra: &[&str]) -> String {
        let output = self
            .command()
            .arg("add")
            .arg(title)
            .args(extra)
            .output()
            .expect("Failed to run add");
        assert!(
            output.status.success(),
            "add failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        extract_uuid(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Pulls the first UUID out of command output, colored or not.
pub fn extract_uuid(text: &str) -> String {
    let bytes = text.as_bytes();
    (0..bytes.len().saturating_sub(35))
        .filter_map(|i| std::str::from_utf8(&bytes[i..i + 36]).ok())
        .find(|candidate| uuid::Uuid::parse_str(candidate).is_ok())
        .map(str::to_string)
        .expect("No UUID found in output")
}

/// Utility functions for test assertions
pub mod assertions {
    use predicates::prelude::*;

    /// Predicate to check if output indicates successful task creation
    pub fn task_created() -> impl Predicate<str> {
        predicate::str::contains("Created task")
            .or(predicate::str::contains("Created recurring task"))
    }

    /// Predicate to check if output contains the task table headers
    pub fn has_task_table_headers() -> impl Predicate<str> {
        predicate::str::contains("ID")
            .and(predicate::str::contains("Title"))
            .and(predicate::str::contains("Status"))
    }

    /// Predicate to check for error messages
    pub fn has_error() -> impl Predicate<str> {
        predicate::str::contains("Error").or(predicate::str::contains("error"))
    }
}
