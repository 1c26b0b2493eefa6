use crate::Result;
use crate::store::{SIDECAR_SUFFIX, SessionStore};
use chrono::Utc;
use logscope_core::{error_types, find_source_refs, is_error_line, match_signature, strip_prefix};
use logscope_types::{CorrelationTag, CorrelationTagKind, SessionInfo, SessionSidecar};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

pub const MAX_CORRELATION_TAGS: usize = 20;

/// Rank the source files and error classes mentioned in a session by frequency.
///
/// Files inside framework packages carry no grouping signal and are skipped.
pub fn extract_correlation_tags<'a, I>(lines: I) -> Vec<CorrelationTag>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<(CorrelationTagKind, String), usize> = HashMap::new();

    for line in lines {
        let message = strip_prefix(line);
        if match_signature(line).is_none() {
            for reference in find_source_refs(message) {
                let name = reference.file_name();
                if !name.is_empty() {
                    *counts
                        .entry((CorrelationTagKind::File, name.to_string()))
                        .or_default() += 1;
                }
            }
        }
        if is_error_line(line) {
            for error in error_types(message) {
                *counts.entry((CorrelationTagKind::Error, error)).or_default() += 1;
            }
        }
    }

    let mut tags: Vec<CorrelationTag> = counts
        .into_iter()
        .map(|((kind, value), count)| CorrelationTag { kind, value, count })
        .collect();
    tags.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.kind.cmp(&b.kind))
            .then_with(|| a.value.cmp(&b.value))
    });
    tags.truncate(MAX_CORRELATION_TAGS);
    tags
}

impl SessionStore {
    pub fn sidecar_path(&self, session: &SessionInfo) -> PathBuf {
        let mut name = session.path.as_os_str().to_os_string();
        name.push(SIDECAR_SUFFIX);
        PathBuf::from(name)
    }

    /// The stored sidecar, if present and readable.
    pub fn load_sidecar(&self, session: &SessionInfo) -> Result<Option<SessionSidecar>> {
        let path = self.sidecar_path(session);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    /// Correlation tags from the sidecar, generating and saving it on first use.
    pub fn correlation_tags(&self, session: &SessionInfo) -> Result<Vec<CorrelationTag>> {
        match self.load_sidecar(session) {
            Ok(Some(sidecar)) => return Ok(sidecar.correlation_tags),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(session = %session.id, error = %err, "regenerating unreadable sidecar");
            }
        }
        Ok(self.rescan_tags(session)?.correlation_tags)
    }

    /// Regenerate the session's correlation tags and overwrite its sidecar.
    pub fn rescan_tags(&self, session: &SessionInfo) -> Result<SessionSidecar> {
        let content = self.read_content(session)?;
        let sidecar = SessionSidecar {
            session: session.id.clone(),
            generated_at: Utc::now(),
            correlation_tags: extract_correlation_tags(content.lines.iter().map(String::as_str)),
        };
        fs::write(
            self.sidecar_path(session),
            serde_json::to_string_pretty(&sidecar)?,
        )?;
        tracing::debug!(session = %session.id, tags = sidecar.correlation_tags.len(), "wrote sidecar");
        Ok(sidecar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_ranked_by_frequency() {
        let log = "\
E/flutter (1): StateError: Bad state at HomePage.build (/app/lib/home.dart:42:18)
E/flutter (1): StateError: Bad state at HomePage.build (/app/lib/home.dart:42:18)
E/flutter (1): FormatException: bad input (/app/lib/parser.dart:7)
#3 StatelessElement.build (package:flutter/src/widgets/framework.dart:4876:49)";

        let tags = extract_correlation_tags(log.lines());
        let rendered: Vec<_> = tags
            .iter()
            .map(|t| format!("{:?}:{}:{}", t.kind, t.value, t.count))
            .collect();
        assert_eq!(
            rendered,
            vec![
                "File:home.dart:2",
                "Error:StateError:2",
                "File:parser.dart:1",
                "Error:FormatException:1",
            ]
        );
    }

    #[test]
    fn test_tags_capped() {
        let log: Vec<String> = (0..30)
            .map(|i| format!("loading module_{i}.dart:1"))
            .collect();
        let tags = extract_correlation_tags(log.iter().map(String::as_str));
        assert_eq!(tags.len(), MAX_CORRELATION_TAGS);
    }
}
