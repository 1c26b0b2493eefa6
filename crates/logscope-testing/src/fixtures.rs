//! Session log text used across integration tests.

/// Error line with no grouping tag and no file reference: only the
/// always-on tasks run for it.
pub const UNTAGGED_ERROR: &str = "StateError: Bad state: Stream has already been listened to";

/// Error line tagged `auth` that references an app file and a symbol.
pub const TAGGED_ERROR: &str =
    "E/Auth ( 812): StateError: token refresh failed in SessionManager.refresh (lib/auth/session.dart:88:5)";

/// Another line of the `auth` group, mentioning a second error type.
pub const TAGGED_CONTEXT: &str = "W/Auth ( 812): retrying after TimeoutException";

pub const APP_FRAME: &str = "#0      SessionManager.refresh (package:my_app/auth/session.dart:88:5)";

pub const FRAMEWORK_FRAME: &str =
    "#1      StatefulElement.build (package:flutter/src/widgets/framework.dart:5592:27)";

/// A line with nothing to analyze.
pub const PLAIN_LINE: &str = "hello world";

/// Session file text: a header block dated `started`, then `lines`.
pub fn session_log(started: &str, lines: &[&str]) -> String {
    let mut text = format!("Session: test\nStarted: {}\n==========\n", started);
    for line in lines {
        text.push_str(line);
        text.push('\n');
    }
    text
}

/// Session file text without a header.
pub fn bare_log(lines: &[&str]) -> String {
    lines.iter().map(|l| format!("{}\n", l)).collect()
}
