use super::walk::files_with_extensions;
use crate::Result;
use crate::collaborators::DocsSearch;
use async_trait::async_trait;
use logscope_types::DocMatch;
use std::path::{Path, PathBuf};

pub const DOC_EXTENSIONS: &[&str] = &["md", "markdown", "txt", "rst", "adoc"];

const MAX_LINE_CHARS: usize = 200;

/// Case-insensitive token search over documentation files.
#[derive(Debug, Clone)]
pub struct DocsScanner {
    root: Option<PathBuf>,
}

impl DocsScanner {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }
}

/// At most one match per line, attributed to the first token it contains.
pub(crate) fn scan_docs(root: &Path, tokens: &[String], limit: usize) -> Vec<DocMatch> {
    let needles: Vec<(String, &String)> = tokens
        .iter()
        .filter(|t| !t.trim().is_empty())
        .map(|t| (t.to_lowercase(), t))
        .collect();
    if needles.is_empty() || limit == 0 {
        return Vec::new();
    }

    let mut found = Vec::new();
    for path in files_with_extensions(root, DOC_EXTENSIONS) {
        let Ok(bytes) = std::fs::read(&path) else {
            continue;
        };
        let content = String::from_utf8_lossy(&bytes);
        for (index, line) in content.lines().enumerate() {
            let lower = line.to_lowercase();
            let Some((_, token)) = needles.iter().find(|(needle, _)| lower.contains(needle.as_str()))
            else {
                continue;
            };
            found.push(DocMatch {
                file: path.strip_prefix(root).unwrap_or(&path).to_path_buf(),
                line: index as u32 + 1,
                matched_token: (*token).clone(),
                line_text: line.trim().chars().take(MAX_LINE_CHARS).collect(),
            });
            if found.len() >= limit {
                return found;
            }
        }
    }
    found
}

#[async_trait]
impl DocsSearch for DocsScanner {
    async fn search(&self, tokens: &[String], limit: usize) -> Result<Vec<DocMatch>> {
        let Some(root) = self.root.clone() else {
            return Ok(Vec::new());
        };
        let tokens = tokens.to_vec();
        Ok(tokio::task::spawn_blocking(move || scan_docs(&root, &tokens, limit)).await?)
    }
}
