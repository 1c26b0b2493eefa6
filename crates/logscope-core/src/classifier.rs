use logscope_types::Ecosystem;
use regex::Regex;
use std::sync::LazyLock;

/// Ordered ecosystem signatures. First match wins.
///
/// Each pattern must only fire on framework/runtime code; user packages that
/// happen to share a word (`com.example.android.ui`) are guarded by requiring
/// the namespace to start the frame token.
pub const FRAMEWORK_SIGNATURES: &[(Ecosystem, &str)] = &[
    (
        Ecosystem::MobileUi,
        r"package:flutter(?:_test|_driver|_localizations|_web_plugins)?/",
    ),
    (
        Ecosystem::MobileUi,
        r"(?:^|[\s(])(?:androidx?|com\.android\.internal|com\.google\.android\.material|dalvik\.system)\.",
    ),
    (Ecosystem::MobileUi, r"\b(?:UIKitCore|SwiftUI|libdispatch\.dylib)\b"),
    (Ecosystem::DartSdk, r"\bdart:[a-z_]+"),
    (
        Ecosystem::Vendor,
        r"[\\/](?:node_modules|\.pub-cache|vendor|site-packages|dist-packages|Pods|\.cargo[\\/]registry)[\\/]",
    ),
    (
        Ecosystem::Anonymous,
        r"<anonymous>|<asynchronous suspension>|\(native\)|\[native code\]|<unknown>",
    ),
    (
        Ecosystem::GoRuntime,
        r"[\\/]src[\\/]runtime[\\/]|\bruntime\.(?:goexit|gopanic|main)\b",
    ),
    (
        Ecosystem::Java,
        r"(?:^|[\s(])(?:java|javax|jdk\.internal|sun)\.[a-z]",
    ),
    (Ecosystem::Kotlin, r"(?:^|[\s(])(?:kotlin|kotlinx)\.[a-z]"),
    (Ecosystem::DotNet, r"(?:^|[\s(])(?:System|Microsoft)\.[A-Z]"),
];

static COMPILED_SIGNATURES: LazyLock<Vec<(Ecosystem, Regex)>> = LazyLock::new(|| {
    FRAMEWORK_SIGNATURES
        .iter()
        .map(|(eco, pattern)| (*eco, Regex::new(pattern).unwrap()))
        .collect()
});

static ABSOLUTE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|[\s(\['"=@])(?:[A-Za-z]:[\\/]|/)[^\s/\\]|file:///"#).unwrap()
});

/// The ecosystem whose signature matches `text`, if any.
pub fn match_signature(text: &str) -> Option<Ecosystem> {
    COMPILED_SIGNATURES
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(eco, _)| *eco)
}

/// Whether a stack frame belongs to framework/runtime code.
///
/// Order of precedence:
/// 1. A path under `workspace_root` is always application code.
/// 2. Ecosystem signature table.
/// 3. With a known root: absolute paths elsewhere are framework, relative ones app.
/// 4. Without a root: application.
pub fn is_framework_frame(text: &str, workspace_root: Option<&str>) -> bool {
    let root = workspace_root.and_then(normalized_root);

    if let Some(root) = &root
        && contains_path_under(text, root)
    {
        return false;
    }

    if match_signature(text).is_some() {
        return true;
    }

    match root {
        Some(_) => ABSOLUTE_PATH.is_match(text),
        None => false,
    }
}

pub fn is_app_frame(text: &str, workspace_root: Option<&str>) -> bool {
    !is_framework_frame(text, workspace_root)
}

fn normalized_root(root: &str) -> Option<String> {
    let root = slash_lower(root.trim());
    let root = root.trim_end_matches('/');
    if root.is_empty() {
        None
    } else {
        Some(root.to_string())
    }
}

fn contains_path_under(text: &str, root: &str) -> bool {
    slash_lower(text).contains(&format!("{}/", root))
}

fn slash_lower(s: &str) -> String {
    s.replace('\\', "/").to_lowercase()
}
