use crate::Result;
use logscope_core::{expand_tilde, resolve_data_dir};
use logscope_sessions::{DEFAULT_EXTENSIONS, SearchLimits};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub wave1_timeout_ms: u64,
    pub task_timeout_ms: u64,
    pub related_line_limit: usize,
    pub preview_context_lines: usize,
    pub history_limit: usize,
    pub max_referenced_files: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            wave1_timeout_ms: 5_000,
            task_timeout_ms: 15_000,
            related_line_limit: 200,
            preview_context_lines: 5,
            history_limit: 5,
            max_referenced_files: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_results: usize,
    pub max_results_per_file: usize,
    pub symbol_limit: usize,
    pub docs_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 50,
            max_results_per_file: 5,
            symbol_limit: 20,
            docs_limit: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    pub extensions: Vec<String>,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            root: None,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_root: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueTrackerConfig {
    pub enabled: bool,
}

impl Default for IssueTrackerConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrashReportingConfig {
    /// Program and arguments; error tokens are appended
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub console_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub issue_tracker: IssueTrackerConfig,
    #[serde(default)]
    pub crash_reporting: CrashReportingConfig,
}

impl Config {
    /// Load `config.toml` from the resolved data directory.
    pub fn load(data_dir: Option<&str>) -> Result<Self> {
        let config_path = Self::default_path(data_dir)?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path(data_dir: Option<&str>) -> Result<PathBuf> {
        Ok(resolve_data_dir(data_dir)?.join(CONFIG_FILE))
    }

    /// Session root with `~` expanded; defaults to `<data dir>/sessions`.
    pub fn sessions_root(&self, data_dir: &Path) -> PathBuf {
        match &self.sessions.root {
            Some(root) => expand_tilde(&root.to_string_lossy()),
            None => data_dir.join("sessions"),
        }
    }

    pub fn workspace_root(&self) -> Option<PathBuf> {
        self.workspace
            .root
            .as_ref()
            .map(|root| expand_tilde(&root.to_string_lossy()))
    }

    /// Documentation root; falls back to the workspace root.
    pub fn docs_root(&self) -> Option<PathBuf> {
        self.workspace
            .docs_root
            .as_ref()
            .map(|root| expand_tilde(&root.to_string_lossy()))
            .or_else(|| self.workspace_root())
    }
}

/// Resolved knobs the orchestrator runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisSettings {
    pub wave1_timeout: Duration,
    pub task_timeout: Duration,
    pub related_line_limit: usize,
    pub max_referenced_files: usize,
    pub symbol_limit: usize,
    pub docs_limit: usize,
    pub search: SearchLimits,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for AnalysisSettings {
    fn from(config: &Config) -> Self {
        Self {
            wave1_timeout: Duration::from_millis(config.analysis.wave1_timeout_ms),
            task_timeout: Duration::from_millis(config.analysis.task_timeout_ms),
            related_line_limit: config.analysis.related_line_limit,
            max_referenced_files: config.analysis.max_referenced_files,
            symbol_limit: config.search.symbol_limit,
            docs_limit: config.search.docs_limit,
            search: SearchLimits {
                max_results: config.search.max_results,
                max_results_per_file: config.search.max_results_per_file,
            },
        }
    }
}
