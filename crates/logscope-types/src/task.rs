use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One independently collected diagnostic source within an analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskId {
    Related,
    Source,
    Docs,
    Symbols,
    Tokens,
    Trend,
    Files,
    Github,
    Firebase,
}

impl TaskId {
    /// Tasks launched concurrently in the second wave, in display order.
    pub const WAVE2: [TaskId; 8] = [
        TaskId::Source,
        TaskId::Docs,
        TaskId::Symbols,
        TaskId::Tokens,
        TaskId::Trend,
        TaskId::Files,
        TaskId::Github,
        TaskId::Firebase,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskId::Related => "related",
            TaskId::Source => "source",
            TaskId::Docs => "docs",
            TaskId::Symbols => "symbols",
            TaskId::Tokens => "tokens",
            TaskId::Trend => "trend",
            TaskId::Files => "files",
            TaskId::Github => "github",
            TaskId::Firebase => "firebase",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            TaskId::Related => "Related lines",
            TaskId::Source => "Source context",
            TaskId::Docs => "Documentation",
            TaskId::Symbols => "Symbols",
            TaskId::Tokens => "Other sessions",
            TaskId::Trend => "Recurrence",
            TaskId::Files => "Referenced files",
            TaskId::Github => "Issues & pull requests",
            TaskId::Firebase => "Crash reports",
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Running,
    Done,
    TimedOut,
    Errored,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Done | TaskState::TimedOut | TaskState::Errored)
    }
}

/// Lifecycle of one analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestPhase {
    Idle,
    ShellBuilt,
    Wave1,
    Wave2,
    Finalizing,
    Complete,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wave2_excludes_related() {
        assert!(!TaskId::WAVE2.contains(&TaskId::Related));
        assert_eq!(TaskId::WAVE2.len(), 8);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!TaskState::Pending.is_terminal());
        assert!(!TaskState::Running.is_terminal());
        assert!(TaskState::Done.is_terminal());
        assert!(TaskState::TimedOut.is_terminal());
        assert!(TaskState::Errored.is_terminal());
    }

    #[test]
    fn test_task_id_serializes_lowercase() {
        let json = serde_json::to_string(&TaskId::Firebase).unwrap();
        assert_eq!(json, "\"firebase\"");
    }
}
