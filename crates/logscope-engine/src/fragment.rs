use logscope_types::TaskId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    Content,
    /// Nothing was found; not an error
    Empty,
    /// An optional tool or credential is missing; body holds the hint
    Unavailable,
    TimedOut,
    Failed,
}

/// Rendered form of one section, ready for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub task: Option<TaskId>,
    pub title: String,
    pub body: String,
    pub kind: FragmentKind,
}

impl Fragment {
    pub fn content(task: TaskId, body: impl Into<String>) -> Self {
        Self::for_task(task, FragmentKind::Content, body)
    }

    pub fn empty(task: TaskId, body: impl Into<String>) -> Self {
        Self::for_task(task, FragmentKind::Empty, body)
    }

    pub fn unavailable(task: TaskId, hint: impl Into<String>) -> Self {
        Self::for_task(task, FragmentKind::Unavailable, hint)
    }

    pub fn timed_out(task: TaskId) -> Self {
        Self::for_task(task, FragmentKind::TimedOut, "Timed out")
    }

    pub fn failed(task: TaskId, reason: impl fmt::Display) -> Self {
        Self::for_task(task, FragmentKind::Failed, format!("Failed: {}", reason))
    }

    /// A fragment not tied to a task (trend chart, notices).
    pub fn standalone(title: impl Into<String>, kind: FragmentKind, body: impl Into<String>) -> Self {
        Self {
            task: None,
            title: title.into(),
            body: body.into(),
            kind,
        }
    }

    fn for_task(task: TaskId, kind: FragmentKind, body: impl Into<String>) -> Self {
        Self {
            task: Some(task),
            title: task.title().to_string(),
            body: body.into(),
            kind,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.kind != FragmentKind::Content
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## {}", self.title)?;
        write!(f, "{}", self.body)
    }
}
