use serde::{Deserialize, Serialize};

use crate::fingerprint::ErrorFingerprint;
use crate::frame::SourceRef;

/// The analyzable token set extracted from one log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisTokens {
    /// Exception / error class names (`StateError`, `NullPointerException`)
    pub error_types: Vec<String>,
    /// Identifiers worth resolving as symbols
    pub symbols: Vec<String>,
    /// Referenced source files
    pub files: Vec<SourceRef>,
    /// Other distinctive words (quoted strings, ALL-CAPS markers)
    pub keywords: Vec<String>,
    /// Grouping tag from the line prefix, if any
    pub tag: Option<String>,
    pub fingerprint: ErrorFingerprint,
}

impl AnalysisTokens {
    pub fn is_empty(&self) -> bool {
        self.error_types.is_empty()
            && self.symbols.is_empty()
            && self.files.is_empty()
            && self.keywords.is_empty()
    }

    /// Tokens used for text searches, most specific first.
    pub fn search_terms(&self) -> Vec<String> {
        let mut terms: Vec<String> = Vec::new();
        for t in self
            .error_types
            .iter()
            .chain(&self.symbols)
            .chain(&self.keywords)
        {
            if !terms.contains(t) {
                terms.push(t.clone());
            }
        }
        terms
    }

    /// Merge tokens extracted from related lines, keeping existing order and
    /// capping each list.
    pub fn enrich(&mut self, other: &AnalysisTokens, cap: usize) {
        extend_unique(&mut self.error_types, &other.error_types, cap);
        extend_unique(&mut self.symbols, &other.symbols, cap);
        extend_unique(&mut self.keywords, &other.keywords, cap);
        for file in &other.files {
            if self.files.len() >= cap {
                break;
            }
            if !self.files.iter().any(|f| f.path == file.path) {
                self.files.push(file.clone());
            }
        }
    }
}

fn extend_unique(target: &mut Vec<String>, extra: &[String], cap: usize) {
    for item in extra {
        if target.len() >= cap {
            break;
        }
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}
