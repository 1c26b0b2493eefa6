//! TestWorld pattern for declarative integration test setup.
//!
//! One temp directory holds the data dir (config), the session corpus and a
//! workspace of source files; CLI commands run against all three.

use anyhow::Result;
use assert_cmd::Command;
use logscope_runtime::{CONFIG_FILE, Config};
use logscope_sessions::SessionStore;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Declarative test environment builder.
///
/// # Example
/// ```no_run
/// use logscope_testing::{TestWorld, fixtures};
///
/// let world = TestWorld::new()
///     .with_session("a.log", &fixtures::session_log("2024-05-01", &[fixtures::UNTAGGED_ERROR]));
///
/// let result = world.run(&["recurring"]).unwrap();
/// assert!(result.success());
/// ```
pub struct TestWorld {
    temp_dir: TempDir,
    data_dir: PathBuf,
    sessions_dir: PathBuf,
    workspace_dir: PathBuf,
    env_vars: HashMap<String, String>,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorld {
    /// Create a new isolated test environment.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base_path = temp_dir.path().to_path_buf();
        let data_dir = base_path.join(".logscope");
        let sessions_dir = base_path.join("sessions");
        let workspace_dir = base_path.join("workspace");

        for dir in [&data_dir, &sessions_dir, &workspace_dir] {
            std::fs::create_dir_all(dir).expect("Failed to create test dir");
        }

        Self {
            temp_dir,
            data_dir,
            sessions_dir,
            workspace_dir,
            env_vars: HashMap::new(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }

    pub fn workspace_dir(&self) -> &Path {
        &self.workspace_dir
    }

    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// A store over this world's session corpus.
    pub fn store(&self) -> SessionStore {
        SessionStore::new(&self.sessions_dir)
    }

    /// Write a session file (relative to the sessions dir).
    pub fn with_session(self, relative: &str, content: &str) -> Self {
        self.write_session(relative, content)
            .expect("Failed to write session");
        self
    }

    /// Write a session file and return its path.
    pub fn write_session(&self, relative: &str, content: &str) -> Result<PathBuf> {
        write_file(&self.sessions_dir.join(relative), content)
    }

    /// Write a source or documentation file into the workspace.
    pub fn with_workspace_file(self, relative: &str, content: &str) -> Self {
        write_file(&self.workspace_dir.join(relative), content)
            .expect("Failed to write workspace file");
        self
    }

    /// Save `config` as the data dir's config.toml.
    pub fn with_config(self, config: &Config) -> Self {
        config
            .save_to(&self.data_dir.join(CONFIG_FILE))
            .expect("Failed to write config");
        self
    }

    /// Set the modification time of a session file, in seconds since the epoch.
    pub fn set_session_mtime(&self, relative: &str, unix_secs: u64) -> Result<()> {
        let time = SystemTime::UNIX_EPOCH + Duration::from_secs(unix_secs);
        filetime::set_file_mtime(
            self.sessions_dir.join(relative),
            filetime::FileTime::from_system_time(time),
        )?;
        Ok(())
    }

    /// Set an environment variable for CLI execution.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    /// Configure a CLI command with this test environment's directories.
    pub fn configure_command<'a>(&self, cmd: &'a mut Command) -> &'a mut Command {
        cmd.arg("--data-dir")
            .arg(&self.data_dir)
            .arg("--sessions-dir")
            .arg(&self.sessions_dir)
            .arg("--workspace-root")
            .arg(&self.workspace_dir)
            .arg("--format")
            .arg("plain");

        cmd.current_dir(self.temp_dir.path());
        // Keep tests independent of the developer's environment
        cmd.env_remove("LOGSCOPE_PATH").env_remove("RUST_LOG");

        for (key, value) in &self.env_vars {
            cmd.env(key, value);
        }

        cmd
    }

    /// Execute the logscope binary in this environment.
    ///
    /// Requires `CARGO_BIN_EXE_logscope`, which cargo sets for the CLI
    /// crate's own integration tests.
    #[allow(deprecated)]
    pub fn run(&self, args: &[&str]) -> Result<CliResult> {
        let mut cmd = Command::cargo_bin("logscope")
            .map_err(|e| anyhow::anyhow!("Failed to find logscope binary: {}", e))?;

        self.configure_command(&mut cmd);
        cmd.args(args);

        let output = cmd.output()?;

        Ok(CliResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

fn write_file(path: &Path, content: &str) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(path.to_path_buf())
}

/// Result of a CLI command execution.
#[derive(Debug)]
pub struct CliResult {
    pub status: std::process::ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CliResult {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Parse stdout as JSON.
    pub fn json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.stdout)?)
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }
}
