use regex::Regex;
use std::sync::LazyLock;

/// Tags emitted by shared logging facades. They carry no grouping signal on
/// their own, so the message body is inspected for a more specific sub-tag.
pub const GENERIC_TAGS: &[&str] = &[
    "flutter",
    "dart",
    "system.out",
    "system.err",
    "chromium",
    "console",
    "stdout",
    "stderr",
];

// "D/FlutterJNI( 3861): msg", "I/flutter ( 9812): msg", "W/Tag: msg"
static LOGCAT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z])/([^:(\s]+)\s*(?:\(\s*\d+\s*\))?:\s").unwrap());

// "[Auth] msg"
static BRACKET_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([A-Za-z][\w.\-]*)\]\s").unwrap());

static INLINE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([A-Za-z][\w.\-]*)\]").unwrap());

static LEADING_CAPS_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z][A-Z0-9_\-]{2,})(?:[\s:]|$)").unwrap());

struct Prefix<'a> {
    severity: Option<char>,
    tag: String,
    rest: &'a str,
}

fn parse_prefix(text: &str) -> Option<Prefix<'_>> {
    if let Some(caps) = LOGCAT_PREFIX.captures(text) {
        let end = caps.get(0).map(|m| m.end()).unwrap_or(0);
        return Some(Prefix {
            severity: caps[1].chars().next(),
            tag: caps[2].to_lowercase(),
            rest: &text[end..],
        });
    }

    if let Some(caps) = BRACKET_PREFIX.captures(text) {
        let end = caps.get(0).map(|m| m.end()).unwrap_or(0);
        return Some(Prefix {
            severity: None,
            tag: caps[1].to_lowercase(),
            rest: &text[end..],
        });
    }

    None
}

fn sub_tag(rest: &str) -> Option<String> {
    if let Some(caps) = INLINE_MARKER.captures(rest) {
        return Some(caps[1].to_lowercase());
    }
    LEADING_CAPS_TOKEN
        .captures(rest.trim_start())
        .map(|caps| caps[1].to_lowercase())
}

/// Grouping tag of a structured log line, lowercased.
///
/// Only prefixes at column 0 are recognized. Generic facade tags resolve to a
/// more specific sub-tag when the message carries one.
pub fn parse_source_tag(text: &str) -> Option<String> {
    let prefix = parse_prefix(text)?;
    if GENERIC_TAGS.contains(&prefix.tag.as_str())
        && let Some(sub) = sub_tag(prefix.rest)
    {
        return Some(sub);
    }
    Some(prefix.tag)
}

/// Top-level prefix tag, lowercased, before sub-tag resolution.
pub fn parse_logcat_tag(text: &str) -> Option<String> {
    parse_prefix(text).map(|p| p.tag)
}

/// Severity letter of a logcat-style prefix (`V`, `D`, `I`, `W`, `E`, `F`).
pub fn severity_of(text: &str) -> Option<char> {
    parse_prefix(text).and_then(|p| p.severity)
}

/// The message body after a recognized prefix, or the whole line.
pub fn strip_prefix(text: &str) -> &str {
    parse_prefix(text).map(|p| p.rest).unwrap_or(text)
}
