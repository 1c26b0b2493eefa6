use crate::classifier::is_app_frame;
use logscope_types::{SourceRef, StackFrame};
use regex::Regex;
use std::sync::LazyLock;

/// Line shapes recognized as stack frames.
const FRAME_PATTERNS: &[&str] = &[
    // JS / JVM / .NET: "    at Foo.bar (file.js:1:2)"
    r"^\s*at\s+\S",
    // Dart / Flutter / gdb: "#12   Element.rebuild (package:...)"
    r"^\s*#\d+\s+\S",
    // Python: '  File "app.py", line 12, in main'
    r#"^\s*File "[^"]+", line \d+"#,
    // Go: "\t/usr/local/go/src/runtime/panic.go:884 +0x213"
    r"^\s+\S+\.go:\d+",
    // Dart terse: "package:app/home.dart 12:3   build"
    r"^\s*(?:package:|dart:)\S+\s+\d+:\d+",
    // Apple crash reports: "3   UIKitCore   0x00000001a2b3c4d5 ..."
    r"^\s*\d+\s+\S+\s+0x[0-9a-fA-F]+",
];

static COMPILED_FRAME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    FRAME_PATTERNS
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

const SOURCE_EXTENSIONS: &str = "dart|kts?|java|tsx?|jsx?|mjs|cjs|py|rs|go|swift|mm?|cs|cpp|cc|cxx|hpp|hh?|c|rb|php|scala";

static SOURCE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?P<path>(?:file:///|package:|dart:|[A-Za-z]:[\\/])?[\w.\-/\\@+]*\.(?:{}))\b(?::line\s+(?P<nline>\d+)|:(?P<line>\d+)(?::(?P<col>\d+))?|\s+(?P<tline>\d+):(?P<tcol>\d+)\b)?",
        SOURCE_EXTENSIONS
    ))
    .unwrap()
});

static PYTHON_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"File "(?P<path>[^"]+)", line (?P<line>\d+)"#).unwrap());

pub fn is_frame_line(text: &str) -> bool {
    COMPILED_FRAME_PATTERNS.iter().any(|re| re.is_match(text))
}

/// All source references in `text`, in order of appearance.
pub fn find_source_refs(text: &str) -> Vec<SourceRef> {
    if let Some(caps) = PYTHON_REF.captures(text) {
        let mut r = SourceRef::new(&caps["path"]);
        r.line = caps["line"].parse().ok();
        return vec![r];
    }

    SOURCE_REF
        .captures_iter(text)
        .map(|caps| {
            let mut r = SourceRef::new(caps["path"].trim_start_matches("file://"));
            let line = caps
                .name("line")
                .or_else(|| caps.name("nline"))
                .or_else(|| caps.name("tline"));
            let column = caps.name("col").or_else(|| caps.name("tcol"));
            r.line = line.and_then(|m| m.as_str().parse().ok());
            r.column = column.and_then(|m| m.as_str().parse().ok());
            r
        })
        .collect()
}

/// `text` with every source reference removed.
pub(crate) fn strip_source_refs(text: &str) -> String {
    let text = PYTHON_REF.replace_all(text, "");
    SOURCE_REF.replace_all(&text, "").into_owned()
}

/// The first source reference in `text`.
pub fn parse_source_ref(text: &str) -> Option<SourceRef> {
    find_source_refs(text).into_iter().next()
}

/// Extract and classify every frame line.
pub fn extract_frames<'a, I>(lines: I, workspace_root: Option<&str>) -> Vec<StackFrame>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .filter(|line| is_frame_line(line))
        .map(|line| StackFrame {
            text: line.trim().to_string(),
            is_app: is_app_frame(line, workspace_root),
            source_ref: parse_source_ref(line),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use logscope_types::FrameSummary;

    #[test]
    fn test_frame_line_shapes() {
        assert!(is_frame_line("    at Foo.bar (file.js:1:2)"));
        assert!(is_frame_line("#12     Element.rebuild (package:flutter/src/widgets/framework.dart:5187:7)"));
        assert!(is_frame_line(r#"  File "/srv/app/main.py", line 12, in main"#));
        assert!(is_frame_line("\t/usr/local/go/src/runtime/panic.go:884 +0x213"));
        assert!(is_frame_line("package:app/home.dart 12:3   build"));
        assert!(!is_frame_line("E/flutter (1234): Bad state: No element"));
        assert!(!is_frame_line("plain text"));
    }

    #[test]
    fn test_parse_source_ref_variants() {
        let r = parse_source_ref("(package:flutter/src/widgets/framework.dart:5187:7)").unwrap();
        assert_eq!(r.path, "package:flutter/src/widgets/framework.dart");
        assert_eq!(r.line, Some(5187));
        assert_eq!(r.column, Some(7));

        let r = parse_source_ref(r"at Program.Main() in C:\src\App\Program.cs:line 14").unwrap();
        assert_eq!(r.path, r"C:\src\App\Program.cs");
        assert_eq!(r.line, Some(14));

        let r = parse_source_ref(r#"File "/srv/app/main.py", line 12, in main"#).unwrap();
        assert_eq!(r.path, "/srv/app/main.py");
        assert_eq!(r.line, Some(12));

        let r = parse_source_ref("package:app/home.dart 12:3   build").unwrap();
        assert_eq!(r.path, "package:app/home.dart");
        assert_eq!((r.line, r.column), (Some(12), Some(3)));

        assert_eq!(parse_source_ref("no references here."), None);
    }

    #[test]
    fn test_extract_frames_classifies_each_frame() {
        let log = "\
E/flutter ( 4411): Bad state: No element
#0      ListMixin.first (dart:collection/list.dart:167:5)
#1      HomePage.build (/home/dev/app/lib/home.dart:42:18)
#2      StatelessElement.build (package:flutter/src/widgets/framework.dart:4876:49)
#3      <asynchronous suspension>";

        let frames = extract_frames(log.lines(), Some("/home/dev/app"));
        assert_eq!(frames.len(), 4);
        assert!(!frames[0].is_app);
        assert!(frames[1].is_app);
        assert_eq!(
            frames[1].source_ref.as_ref().map(|r| r.file_name()),
            Some("home.dart")
        );
        assert!(!frames[2].is_app);
        assert!(!frames[3].is_app);

        let summary = FrameSummary::from_frames(&frames);
        assert_eq!(summary.to_string(), "4 frames (1 app, 3 framework)");
    }
}
