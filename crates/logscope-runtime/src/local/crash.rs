use super::command;
use crate::Result;
use crate::collaborators::CrashReporter;
use crate::config::CrashReportingConfig;
use async_trait::async_trait;
use logscope_types::{CrashIssue, CrashReport};

pub const CRASH_UNCONFIGURED_HINT: &str =
    "Set [crash_reporting] command in config.toml to see crash reports";

/// Crash issues from a configured external command.
///
/// The command receives the error tokens as trailing arguments and prints a
/// JSON array of crash issues on stdout.
#[derive(Debug, Clone, Default)]
pub struct CommandCrashReporter {
    command: Option<Vec<String>>,
    console_url: Option<String>,
}

impl CommandCrashReporter {
    pub fn new(config: &CrashReportingConfig) -> Self {
        Self {
            command: config.command.clone().filter(|c| !c.is_empty()),
            console_url: config.console_url.clone(),
        }
    }
}

#[async_trait]
impl CrashReporter for CommandCrashReporter {
    async fn lookup(&self, error_tokens: &[String]) -> Result<CrashReport> {
        let Some((program, args)) = self.command.as_deref().and_then(|c| c.split_first()) else {
            return Ok(CrashReport::unavailable(CRASH_UNCONFIGURED_HINT));
        };

        let output = command::run(program, args.iter().chain(error_tokens), None).await?;
        let Some(json) = output else {
            return Ok(CrashReport::unavailable(format!(
                "Crash report command `{}` was not found",
                program
            )));
        };

        let issues: Vec<CrashIssue> = serde_json::from_str(json.trim())?;
        Ok(CrashReport {
            available: true,
            setup_hint: None,
            issues,
            console_url: self.console_url.clone(),
        })
    }
}
