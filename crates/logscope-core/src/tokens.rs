use crate::fingerprint::fingerprint;
use crate::frames::{find_source_refs, strip_source_refs};
use crate::tag::{parse_source_tag, strip_prefix};
use logscope_types::AnalysisTokens;
use regex::Regex;
use std::sync::LazyLock;

const MAX_PER_KIND: usize = 10;

static ERROR_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z][A-Za-z0-9]*(?:Exception|Error))\b").unwrap());

// At least two humps: `ContactAvatar`, `HttpClient`
static CAMEL_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z][a-z0-9]+(?:[A-Z][a-z0-9]*)+)\b").unwrap());

static MEMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]\w*\.([a-z_]\w{2,})\b").unwrap());

static CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]{2,})\s*\(").unwrap());

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["`]([^"`]{3,60})["`]"#).unwrap());

static CAPS_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z][A-Z0-9_\-]{2,}[A-Z0-9])\b").unwrap());

const STOP_SYMBOLS: &[&str] = &[
    "and", "are", "for", "from", "new", "not", "the", "this", "that", "with", "null", "true",
    "false", "line", "file", "async", "await",
];

const STOP_CAPS: &[&str] = &[
    "ERROR", "FATAL", "WARN", "WARNING", "INFO", "DEBUG", "TRACE", "VERBOSE", "CRITICAL",
    "EXCEPTION", "HTTP", "HTTPS", "GET", "POST", "PUT", "PATCH", "DELETE", "NULL", "JSON", "UTC",
    "API", "URL", "TODO",
];

fn push_unique(target: &mut Vec<String>, value: &str) {
    if target.len() < MAX_PER_KIND && !target.iter().any(|v| v == value) {
        target.push(value.to_string());
    }
}

/// Error / exception class names mentioned in `text`, in order of appearance.
pub fn error_types(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    for caps in ERROR_TYPE.captures_iter(text) {
        push_unique(&mut found, &caps[1]);
    }
    found
}

/// Extract the analyzable tokens of one log line.
///
/// An empty result (see [`AnalysisTokens::is_empty`]) means the line offers
/// nothing to look up and no diagnostic task should run.
pub fn extract_tokens(line: &str) -> AnalysisTokens {
    let message = strip_prefix(line);

    let mut files = find_source_refs(message);
    files.truncate(MAX_PER_KIND);

    let text = strip_source_refs(message);

    let error_types = error_types(&text);

    let mut symbols = Vec::new();
    for caps in CAMEL_CASE.captures_iter(&text) {
        let name = &caps[1];
        if !error_types.iter().any(|e| e == name) {
            push_unique(&mut symbols, name);
        }
    }
    for caps in MEMBER.captures_iter(&text).chain(CALL.captures_iter(&text)) {
        let name = &caps[1];
        if !STOP_SYMBOLS.contains(&name.to_lowercase().as_str())
            && !error_types.iter().any(|e| e == name)
        {
            push_unique(&mut symbols, name);
        }
    }

    let mut keywords = Vec::new();
    for caps in QUOTED.captures_iter(&text) {
        push_unique(&mut keywords, caps[1].trim());
    }
    for caps in CAPS_MARKER.captures_iter(&text) {
        let marker = &caps[1];
        if !STOP_CAPS.contains(&marker) {
            push_unique(&mut keywords, marker);
        }
    }

    AnalysisTokens {
        error_types,
        symbols,
        files,
        keywords,
        tag: parse_source_tag(line),
        fingerprint: fingerprint(line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_flutter_error_line() {
        let tokens = extract_tokens(
            "E/flutter ( 4411): Unhandled Exception: StateError: Bad state at HomePage.build (/home/dev/app/lib/home.dart:42:18)",
        );

        assert_eq!(tokens.error_types, vec!["StateError"]);
        assert_eq!(tokens.symbols, vec!["HomePage", "build"]);
        assert_eq!(tokens.files.len(), 1);
        assert_eq!(tokens.files[0].path, "/home/dev/app/lib/home.dart");
        assert_eq!(tokens.files[0].line, Some(42));
        assert_eq!(tokens.tag.as_deref(), Some("flutter"));
        assert!(tokens.keywords.is_empty());
        assert!(!tokens.is_empty());
    }

    #[test]
    fn test_extract_keywords() {
        let tokens = extract_tokens(r#"[Sync] PAYMENT_TIMEOUT while loading "user profile" ERROR"#);
        assert_eq!(tokens.keywords, vec!["user profile", "PAYMENT_TIMEOUT"]);
        assert_eq!(tokens.tag.as_deref(), Some("sync"));
    }

    #[test]
    fn test_plain_text_has_no_tokens() {
        assert!(extract_tokens("hello world").is_empty());
        assert!(extract_tokens("").is_empty());
        assert!(extract_tokens("I/flutter (12): done").is_empty());
    }

    #[test]
    fn test_fingerprint_matches_line_fingerprint() {
        let line = "E/flutter (1): FormatException: Unexpected character";
        assert_eq!(extract_tokens(line).fingerprint, fingerprint(line));
    }
}
