use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::fingerprint::ErrorFingerprint;

/// One captured log file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Path relative to the sessions root, `/`-separated
    pub id: String,
    pub path: PathBuf,
    pub started_at: DateTime<Utc>,
    /// `Key: value` pairs from the session header block
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub header: BTreeMap<String, String>,
    /// Number of header lines (including the divider) to skip when scanning
    #[serde(default)]
    pub header_lines: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationTagKind {
    File,
    Error,
}

/// Auto-extracted label used to group related sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationTag {
    #[serde(rename = "type")]
    pub kind: CorrelationTagKind,
    pub value: String,
    pub count: usize,
}

/// Per-session metadata record stored beside the session file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSidecar {
    pub session: String,
    pub generated_at: DateTime<Utc>,
    pub correlation_tags: Vec<CorrelationTag>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub session: String,
    pub count: usize,
}

/// How often one fingerprint recurs across the session corpus.
///
/// Invariant: `session_count <= total_occurrences`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringErrorRecord {
    pub hash: ErrorFingerprint,
    pub session_count: usize,
    pub total_occurrences: usize,
    pub first_seen: String,
    pub last_seen: String,
    /// Chronological, one point per session containing the fingerprint
    pub timeline: Vec<TimelinePoint>,
    /// Normalized text of the first occurrence, for display
    #[serde(default)]
    pub sample: String,
}

/// A cross-session token search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMatch {
    pub session: String,
    pub line_index: usize,
    pub token: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedLine {
    pub line_index: usize,
    pub text: String,
}

/// Lines of the current file sharing the analyzed line's source tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedLines {
    pub tag: String,
    pub lines: Vec<RelatedLine>,
    /// Total number of matching lines, including ones past the limit
    pub total: usize,
}
