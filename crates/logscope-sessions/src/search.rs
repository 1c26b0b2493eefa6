use crate::Result;
use crate::store::{SessionStore, parse_header, read_log_lines};
use logscope_core::parse_source_tag;
use logscope_types::{RelatedLine, RelatedLines, TokenMatch};
use std::path::Path;

/// Bounds for a cross-session token search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub max_results: usize,
    pub max_results_per_file: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_results: 50,
            max_results_per_file: 5,
        }
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

impl SessionStore {
    /// Case-insensitive search for `token` across sessions, newest first.
    ///
    /// `exclude` skips the file currently being analyzed.
    pub fn search_token(
        &self,
        token: &str,
        limits: SearchLimits,
        exclude: Option<&Path>,
    ) -> Result<Vec<TokenMatch>> {
        let needle = token.trim().to_lowercase();
        if needle.is_empty() || limits.max_results == 0 {
            return Ok(Vec::new());
        }

        let mut matches = Vec::new();
        for session in self.list_sessions()?.iter().rev() {
            if exclude.is_some_and(|path| same_file(path, &session.path)) {
                continue;
            }
            let content = match self.read_content(session) {
                Ok(content) => content,
                Err(err) => {
                    tracing::warn!(session = %session.id, error = %err, "skipping unreadable session");
                    continue;
                }
            };

            let hits = content
                .numbered()
                .filter(|(_, line)| line.to_lowercase().contains(&needle))
                .take(limits.max_results_per_file);
            for (line_index, line) in hits {
                matches.push(TokenMatch {
                    session: session.id.clone(),
                    line_index,
                    token: token.to_string(),
                    text: line.trim().to_string(),
                });
                if matches.len() >= limits.max_results {
                    return Ok(matches);
                }
            }
        }
        Ok(matches)
    }
}

/// Lines of `path` whose source tag equals `tag`, capped at `limit`.
///
/// `total` counts every match so callers can tell the list was truncated.
/// `exclude_line` is the analyzed line itself.
pub fn related_lines(
    path: &Path,
    tag: &str,
    exclude_line: Option<usize>,
    limit: usize,
) -> Result<RelatedLines> {
    let lines = read_log_lines(path)?;
    let (_, skip) = parse_header(&lines);

    let mut related = RelatedLines {
        tag: tag.to_string(),
        ..RelatedLines::default()
    };
    for (line_index, text) in lines.iter().enumerate().skip(skip) {
        if Some(line_index) == exclude_line {
            continue;
        }
        if parse_source_tag(text).as_deref() != Some(tag) {
            continue;
        }
        related.total += 1;
        if related.lines.len() < limit {
            related.lines.push(RelatedLine {
                line_index,
                text: text.clone(),
            });
        }
    }
    Ok(related)
}
