use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::fingerprint::ErrorFingerprint;
use crate::frame::SourceRef;
use crate::session::{RecurringErrorRecord, RelatedLines, TokenMatch};
use crate::task::TaskId;

// ============================================================================
// Collaborator results
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewLine {
    /// 1-based line number
    pub number: u32,
    pub text: String,
    pub is_target: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub hash: String,
    pub author: String,
    pub date: String,
    pub summary: String,
}

/// Developer marker (TODO, FIXME, BUG, ...) near the target line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub line: u32,
    pub marker: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlameInfo {
    pub commit: String,
    pub author: String,
    pub date: String,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStat {
    pub files_changed: usize,
    pub insertions: usize,
    pub deletions: usize,
}

/// What the source lookup collaborator knows about one referenced file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceContext {
    pub reference: SourceRef,
    /// `None` when the file does not exist in the workspace
    pub resolved_path: Option<PathBuf>,
    #[serde(default)]
    pub preview: Vec<PreviewLine>,
    #[serde(default)]
    pub file_history: Vec<CommitSummary>,
    #[serde(default)]
    pub line_history: Vec<CommitSummary>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub line_count: usize,
}

impl SourceContext {
    pub fn not_found(reference: SourceRef) -> Self {
        Self {
            reference,
            resolved_path: None,
            preview: vec![],
            file_history: vec![],
            line_history: vec![],
            annotations: vec![],
            imports: vec![],
            line_count: 0,
        }
    }

    pub fn exists(&self) -> bool {
        self.resolved_path.is_some()
    }
}

/// Source context plus version-control attribution of the target line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSection {
    pub context: SourceContext,
    pub blame: Option<BlameInfo>,
    pub blame_stat: Option<CommitStat>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolMatch {
    pub name: String,
    pub kind: String,
    pub location: SourceRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMatch {
    pub file: PathBuf,
    pub line: u32,
    pub matched_token: String,
    pub line_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    pub number: u64,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
    pub number: u64,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueReport {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_hint: Option<String>,
    pub introducing_pr: Option<PullRequestRef>,
    #[serde(default)]
    pub file_prs: Vec<PullRequestRef>,
    #[serde(default)]
    pub issues: Vec<IssueRef>,
}

impl IssueReport {
    pub fn unavailable(hint: impl Into<String>) -> Self {
        Self {
            available: false,
            setup_hint: Some(hint.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.introducing_pr.is_none() && self.file_prs.is_empty() && self.issues.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrashIssue {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub event_count: u64,
    #[serde(default)]
    pub user_count: u64,
    #[serde(default)]
    pub console_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrashReport {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_hint: Option<String>,
    #[serde(default)]
    pub issues: Vec<CrashIssue>,
    #[serde(default)]
    pub console_url: Option<String>,
}

impl CrashReport {
    pub fn unavailable(hint: impl Into<String>) -> Self {
        Self {
            available: false,
            setup_hint: Some(hint.into()),
            ..Default::default()
        }
    }
}

/// Summary of one file referenced by the analyzed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAnalysis {
    pub reference: SourceRef,
    pub exists: bool,
    pub line_count: usize,
    pub annotation_count: usize,
    pub last_commit: Option<CommitSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendSection {
    pub fingerprint: ErrorFingerprint,
    /// `None` when the fingerprint has never been seen in any session
    pub record: Option<RecurringErrorRecord>,
}

impl TrendSection {
    pub fn point_count(&self) -> usize {
        self.record.as_ref().map(|r| r.timeline.len()).unwrap_or(0)
    }
}

// ============================================================================
// Section accumulator
// ============================================================================

/// Partial results of one analysis request, one disjoint key per task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<RelatedLines>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs: Option<Vec<DocMatch>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbols: Option<Vec<SymbolMatch>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<TokenMatch>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<TrendSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileAnalysis>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<IssueReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firebase: Option<CrashReport>,
}

impl SectionData {
    /// Right-biased shallow union: every key present in `other` replaces ours.
    pub fn merge(&mut self, other: SectionData) {
        let SectionData {
            related,
            source,
            docs,
            symbols,
            tokens,
            trend,
            files,
            github,
            firebase,
        } = other;

        if related.is_some() {
            self.related = related;
        }
        if source.is_some() {
            self.source = source;
        }
        if docs.is_some() {
            self.docs = docs;
        }
        if symbols.is_some() {
            self.symbols = symbols;
        }
        if tokens.is_some() {
            self.tokens = tokens;
        }
        if trend.is_some() {
            self.trend = trend;
        }
        if files.is_some() {
            self.files = files;
        }
        if github.is_some() {
            self.github = github;
        }
        if firebase.is_some() {
            self.firebase = firebase;
        }
    }

    pub fn has(&self, id: TaskId) -> bool {
        match id {
            TaskId::Related => self.related.is_some(),
            TaskId::Source => self.source.is_some(),
            TaskId::Docs => self.docs.is_some(),
            TaskId::Symbols => self.symbols.is_some(),
            TaskId::Tokens => self.tokens.is_some(),
            TaskId::Trend => self.trend.is_some(),
            TaskId::Files => self.files.is_some(),
            TaskId::Github => self.github.is_some(),
            TaskId::Firebase => self.firebase.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_is_right_biased_and_keeps_disjoint_keys() {
        let mut acc = SectionData {
            docs: Some(vec![]),
            ..Default::default()
        };
        let doc = DocMatch {
            file: PathBuf::from("README.md"),
            line: 3,
            matched_token: "StateError".into(),
            line_text: "StateError is thrown when".into(),
        };

        acc.merge(SectionData {
            docs: Some(vec![doc.clone()]),
            github: Some(IssueReport::unavailable("install gh")),
            ..Default::default()
        });
        acc.merge(SectionData {
            symbols: Some(vec![]),
            ..Default::default()
        });

        assert_eq!(acc.docs, Some(vec![doc]));
        assert!(acc.has(TaskId::Github));
        assert!(acc.has(TaskId::Symbols));
        assert!(!acc.has(TaskId::Source));
    }

    #[test]
    fn test_unavailable_reports() {
        let issues = IssueReport::unavailable("run `gh auth login`");
        assert!(!issues.available);
        assert!(issues.is_empty());
        assert_eq!(issues.setup_hint.as_deref(), Some("run `gh auth login`"));

        let crashes = CrashReport::unavailable("configure crash_reporting.command");
        assert!(!crashes.available);
        assert!(crashes.issues.is_empty());
    }
}
