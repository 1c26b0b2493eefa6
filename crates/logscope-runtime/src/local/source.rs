use super::git;
use super::walk::locate;
use crate::Result;
use crate::collaborators::SourceLookup;
use async_trait::async_trait;
use logscope_types::{Annotation, PreviewLine, SourceContext, SourceRef};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

const ANNOTATION_RADIUS: u32 = 20;
const MAX_IMPORTS: usize = 20;

static ANNOTATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(TODO|FIXME|BUG|HACK|XXX)\b[:\s(]*(.*)").unwrap());

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*(?:import|export|from|use|require|#include|part)\b.*"#).unwrap()
});

/// Reads referenced files from the local workspace.
#[derive(Debug, Clone)]
pub struct FsSourceLookup {
    root: Option<PathBuf>,
    context_lines: u32,
    history_limit: usize,
}

impl FsSourceLookup {
    pub fn new(root: Option<PathBuf>, context_lines: usize, history_limit: usize) -> Self {
        Self {
            root,
            context_lines: u32::try_from(context_lines).unwrap_or(u32::MAX),
            history_limit,
        }
    }

    /// Map a reference from a log line to a file on disk.
    pub fn resolve(&self, reference: &SourceRef) -> Option<PathBuf> {
        resolve_in(self.root.as_deref(), &reference.path)
    }
}

fn resolve_in(root: Option<&Path>, raw: &str) -> Option<PathBuf> {
    let raw = raw.strip_prefix("file://").unwrap_or(raw);
    let path = Path::new(raw);
    if path.is_absolute() && path.is_file() {
        return Some(path.to_path_buf());
    }
    let root = root?;

    // package:<name>/<rest> lives at lib/<rest> in its package
    let relative = match raw.strip_prefix("package:") {
        Some(rest) => {
            let rest = rest.split_once('/').map(|(_, r)| r).unwrap_or(rest);
            PathBuf::from("lib").join(rest)
        }
        None => PathBuf::from(raw.trim_start_matches('/')),
    };
    locate(root, &relative)
}

/// 1-based inclusive window of `radius` lines around `target`.
fn window(target: u32, radius: u32, line_count: usize) -> (u32, u32) {
    let last = u32::try_from(line_count).unwrap_or(u32::MAX).max(1);
    let target = target.clamp(1, last);
    (
        target.saturating_sub(radius).max(1),
        target.saturating_add(radius).min(last),
    )
}

fn preview(lines: &[&str], target: Option<u32>, radius: u32) -> Vec<PreviewLine> {
    let (start, end) = match target {
        Some(t) => window(t, radius, lines.len()),
        None => (1, radius.saturating_mul(2).saturating_add(1).min(lines.len() as u32)),
    };
    (start..=end)
        .filter_map(|number| {
            lines.get(number as usize - 1).map(|text| PreviewLine {
                number,
                text: text.to_string(),
                is_target: Some(number) == target,
            })
        })
        .collect()
}

fn annotations(lines: &[&str], target: Option<u32>) -> Vec<Annotation> {
    let (start, end) = match target {
        Some(t) => window(t, ANNOTATION_RADIUS, lines.len()),
        None => (1, lines.len() as u32),
    };
    (start..=end)
        .filter_map(|number| {
            let text = lines.get(number as usize - 1)?;
            let caps = ANNOTATION_RE.captures(text)?;
            Some(Annotation {
                line: number,
                marker: caps[1].to_string(),
                text: caps[2].trim().to_string(),
            })
        })
        .collect()
}

fn imports(lines: &[&str]) -> Vec<String> {
    lines
        .iter()
        .filter(|line| IMPORT_RE.is_match(line))
        .take(MAX_IMPORTS)
        .map(|line| line.trim().to_string())
        .collect()
}

#[async_trait]
impl SourceLookup for FsSourceLookup {
    async fn lookup(&self, reference: &SourceRef) -> Result<SourceContext> {
        let resolved = {
            let root = self.root.clone();
            let raw = reference.path.clone();
            tokio::task::spawn_blocking(move || resolve_in(root.as_deref(), &raw)).await?
        };
        let Some(path) = resolved else {
            tracing::debug!(reference = %reference, "source file not found");
            return Ok(SourceContext::not_found(reference.clone()));
        };

        let bytes = tokio::fs::read(&path).await?;
        let content = String::from_utf8_lossy(&bytes);
        let lines: Vec<&str> = content.lines().collect();

        let preview = preview(&lines, reference.line, self.context_lines);
        let range = match (preview.first(), preview.last(), reference.line) {
            (Some(first), Some(last), Some(_)) => Some((first.number, last.number)),
            _ => None,
        };
        let (file_history, line_history) = tokio::join!(
            git::history(&path, None, self.history_limit),
            async {
                match range {
                    Some(range) => git::history(&path, Some(range), self.history_limit).await,
                    None => Ok(Vec::new()),
                }
            }
        );

        Ok(SourceContext {
            reference: reference.clone(),
            annotations: annotations(&lines, reference.line),
            imports: imports(&lines),
            line_count: lines.len(),
            preview,
            file_history: file_history.unwrap_or_else(|err| {
                tracing::debug!(path = %path.display(), error = %err, "file history unavailable");
                Vec::new()
            }),
            line_history: line_history.unwrap_or_default(),
            resolved_path: Some(path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HOME: &str = "\
import 'package:flutter/material.dart';
import 'src/api.dart';

class HomePage {
  // TODO: cancel subscription on dispose
  void load() {
    stream.listen(onData);
  }
}
";

    fn workspace() -> TempDir {
        let dir = TempDir::new().unwrap();
        let lib = dir.path().join("lib");
        std::fs::create_dir_all(&lib).unwrap();
        std::fs::write(lib.join("home.dart"), HOME).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_lookup_reads_preview_and_annotations() {
        let dir = workspace();
        let lookup = FsSourceLookup::new(Some(dir.path().to_path_buf()), 2, 0);

        let context = lookup
            .lookup(&SourceRef::new("package:my_app/home.dart").with_line(7))
            .await
            .unwrap();

        assert!(context.exists());
        assert_eq!(context.line_count, 9);
        let numbers: Vec<u32> = context.preview.iter().map(|l| l.number).collect();
        assert_eq!(numbers, vec![5, 6, 7, 8, 9]);
        assert!(context.preview[2].is_target);
        assert_eq!(context.annotations.len(), 1);
        assert_eq!(context.annotations[0].marker, "TODO");
        assert_eq!(context.annotations[0].text, "cancel subscription on dispose");
        assert_eq!(context.imports.len(), 2);
        assert!(context.file_history.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = workspace();
        let lookup = FsSourceLookup::new(Some(dir.path().to_path_buf()), 2, 0);

        let context = lookup
            .lookup(&SourceRef::new("lib/missing.dart").with_line(1))
            .await
            .unwrap();
        assert!(!context.exists());
        assert!(context.preview.is_empty());
    }

    #[test]
    fn test_window_clamps_to_file() {
        assert_eq!(window(1, 5, 3), (1, 3));
        assert_eq!(window(50, 2, 10), (8, 10));
        assert_eq!(window(5, 2, 10), (3, 7));
    }
}
