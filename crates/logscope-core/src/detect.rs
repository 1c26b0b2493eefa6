use crate::tag::severity_of;
use regex::Regex;
use std::sync::LazyLock;

/// Markers that make a line count as an error occurrence.
pub const ERROR_MARKERS: &[&str] = &[
    r"\b[A-Z][A-Za-z0-9]*(?:Exception|Error)\b",
    r"\b(?:ERROR|FATAL|CRITICAL)\b",
    r"\bpanic(?:ked)?\b",
    r"^Traceback \(most recent call last\)",
    r"\bUnhandled\b",
    r"^\s*Caused by:",
];

static COMPILED_MARKERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ERROR_MARKERS
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

/// Whether a log line is a qualifying error occurrence.
pub fn is_error_line(text: &str) -> bool {
    if matches!(severity_of(text), Some('E') | Some('F')) {
        return true;
    }
    COMPILED_MARKERS.iter().any(|re| re.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_lines() {
        assert!(is_error_line("E/flutter (1): something went wrong"));
        assert!(is_error_line("F/libc (77): Fatal signal 11"));
        assert!(is_error_line("Unhandled Exception: StateError"));
        assert!(is_error_line("java.lang.NullPointerException: boom"));
        assert!(is_error_line("2024-01-01 ERROR db down"));
        assert!(is_error_line("thread 'main' panicked at src/main.rs:2:5"));
        assert!(is_error_line("Traceback (most recent call last):"));
        assert!(is_error_line("Caused by: java.io.IOException"));
    }

    #[test]
    fn test_non_error_lines() {
        assert!(!is_error_line("I/flutter (1): build complete"));
        assert!(!is_error_line("W/Choreographer: Skipped 30 frames"));
        assert!(!is_error_line("no errors found"));
        assert!(!is_error_line(""));
    }
}
