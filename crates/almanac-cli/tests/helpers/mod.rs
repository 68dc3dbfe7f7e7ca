use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test harness that runs the CLI inside an isolated working directory
pub struct CliTestHarness {
    temp_dir: TempDir,
}

impl CliTestHarness {
    /// Create a new test harness with an empty working directory
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        Self { temp_dir }
    }

    /// Get a Command instance configured for testing
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("almanac").expect("Failed to find almanac binary");
        cmd.current_dir(self.temp_dir.path());
        cmd.env("ALMANAC_TIMEZONE", "UTC");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Write an export file into the working directory and return its path
    pub fn write_export(&self, name: &str, json: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, json).expect("Failed to write export");
        path
    }

    /// Write the configuration file picked up by default
    pub fn write_config(&self, toml: &str) {
        std::fs::write(self.temp_dir.path().join("almanac.toml"), toml)
            .expect("Failed to write config");
    }

    /// Helper to run a command and assert success
    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    /// Helper to run a command and assert failure
    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }
}

/// Sample exports shared across tests
pub mod fixtures {
    pub const DAILY_WITH_EXCLUSION: &str = r#"[
        {
            "id": "standup",
            "title": "Standup",
            "anchorDate": "2024-01-01",
            "time": "09:00",
            "durationMinutes": 15,
            "recurrence": "daily",
            "exclusions": ["2024-01-03"],
            "completions": ["2024-01-02"]
        }
    ]"#;

    pub const OVERLAPPING_DAY: &str = r#"[
        { "id": "a", "title": "Shoot", "anchorDate": "2024-01-01", "time": "09:00", "durationMinutes": 60 },
        { "id": "b", "title": "Edit", "anchorDate": "2024-01-01", "time": "09:30", "durationMinutes": 60 },
        { "id": "c", "title": "Publish", "anchorDate": "2024-01-01", "time": "10:15", "durationMinutes": 30 },
        { "id": "launch", "title": "Launch day", "anchorDate": "2024-01-01" }
    ]"#;

    pub const BROKEN_RULE: &str = r#"[
        {
            "id": "broken",
            "anchorDate": "2024-01-01",
            "recurrence": "daily",
            "rrule": "FREQ=SOMETIMES",
            "isRecurring": true
        }
    ]"#;
}
