use super::command;
use crate::collaborators::VersionControl;
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::DateTime;
use logscope_types::{BlameInfo, CommitStat, CommitSummary};
use regex::Regex;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

const UNCOMMITTED: &str = "0000000000000000000000000000000000000000";

// Marks our formatted lines in `git log` output that may also carry patches
const SENTINEL: &str = "@@logscope@@";
const FIELD_SEP: char = '\u{1f}';

static SHORTSTAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+) files? changed(?:, (\d+) insertions?\(\+\))?(?:, (\d+) deletions?\(-\))?")
        .unwrap()
});

/// Version control through the `git` executable.
#[derive(Debug, Clone, Default)]
pub struct GitCli {
    /// Working directory for commands that are not about a specific file
    root: Option<PathBuf>,
}

impl GitCli {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }
}

/// Run git from the file's directory so it finds the enclosing repository.
fn split_file(path: &Path) -> (Option<&Path>, &OsStr) {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    (dir, path.file_name().unwrap_or(path.as_os_str()))
}

/// Commands that fail because the file is untracked or outside a repository
/// mean "no data", not an error.
fn command_failure_to_none<T>(result: Result<Option<T>>) -> Result<Option<T>> {
    match result {
        Err(Error::Command { program, message }) => {
            tracing::debug!(%program, %message, "git reported no data");
            Ok(None)
        }
        other => other,
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn blame(&self, path: &Path, line: u32) -> Result<Option<BlameInfo>> {
        let (cwd, file) = split_file(path);
        let range = format!("{},{}", line, line);
        let args = [
            OsStr::new("blame"),
            OsStr::new("--porcelain"),
            OsStr::new("-L"),
            OsStr::new(&range),
            OsStr::new("--"),
            file,
        ];
        let output = command_failure_to_none(command::run("git", args, cwd).await)?;
        Ok(output.as_deref().and_then(parse_porcelain_blame))
    }

    async fn commit_stat(&self, commit: &str) -> Result<Option<CommitStat>> {
        let output = command_failure_to_none(
            command::run(
                "git",
                ["show", "--shortstat", "--format=", commit],
                self.root.as_deref(),
            )
            .await,
        )?;
        Ok(output.as_deref().and_then(parse_shortstat))
    }
}

/// Parse `git blame --porcelain` for a single line. Uncommitted lines have
/// no attribution.
pub fn parse_porcelain_blame(output: &str) -> Option<BlameInfo> {
    let mut lines = output.lines();
    let commit = lines.next()?.split_whitespace().next()?.to_string();
    if commit == UNCOMMITTED {
        return None;
    }

    let mut author = String::new();
    let mut date = String::new();
    let mut summary = String::new();
    for line in lines {
        if let Some(value) = line.strip_prefix("author ") {
            author = value.to_string();
        } else if let Some(value) = line.strip_prefix("author-time ") {
            date = value
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .map(|dt| dt.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
        } else if let Some(value) = line.strip_prefix("summary ") {
            summary = value.to_string();
        } else if line.starts_with('\t') {
            break;
        }
    }

    Some(BlameInfo {
        commit,
        author,
        date,
        summary,
    })
}

/// Parse the summary line of `git show --shortstat`.
pub fn parse_shortstat(output: &str) -> Option<CommitStat> {
    let caps = SHORTSTAT_RE.captures(output)?;
    let number = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    Some(CommitStat {
        files_changed: number(1),
        insertions: number(2),
        deletions: number(3),
    })
}

/// Commits touching `path`, newest first. `range` narrows to a line range.
pub(crate) async fn history(
    path: &Path,
    range: Option<(u32, u32)>,
    limit: usize,
) -> Result<Vec<CommitSummary>> {
    if limit == 0 {
        return Ok(Vec::new());
    }
    let (cwd, file) = split_file(path);
    let file = file.to_string_lossy();
    let mut args = vec![
        "log".to_string(),
        format!("-n{}", limit),
        "--date=short".to_string(),
        format!("--format={SENTINEL}%h%x1f%an%x1f%ad%x1f%s"),
    ];
    match range {
        Some((start, end)) => args.push(format!("-L{},{}:{}", start, end, file)),
        None => {
            args.push("--".to_string());
            args.push(file.into_owned());
        }
    }

    let output = command_failure_to_none(command::run("git", &args, cwd).await)?;
    Ok(output.as_deref().map(parse_log).unwrap_or_default())
}

fn parse_log(output: &str) -> Vec<CommitSummary> {
    output
        .lines()
        .filter_map(|line| line.strip_prefix(SENTINEL))
        .filter_map(|line| {
            let mut fields = line.splitn(4, FIELD_SEP);
            Some(CommitSummary {
                hash: fields.next()?.to_string(),
                author: fields.next()?.to_string(),
                date: fields.next()?.to_string(),
                summary: fields.next().unwrap_or_default().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_porcelain_blame() {
        let output = "\
4f1c2d3e4f5a6b7c8d9e0f1a2b3c4d5e6f7a8b9c 12 12 1
author Dana Reyes
author-mail <dana@example.com>
author-time 1714564800
author-tz +0000
summary Guard stream subscription in HomePage
filename lib/home.dart
\t_sub = stream.listen(onData);
";
        let blame = parse_porcelain_blame(output).unwrap();
        assert_eq!(blame.commit, "4f1c2d3e4f5a6b7c8d9e0f1a2b3c4d5e6f7a8b9c");
        assert_eq!(blame.author, "Dana Reyes");
        assert_eq!(blame.date, "2024-05-01");
        assert_eq!(blame.summary, "Guard stream subscription in HomePage");
    }

    #[test]
    fn test_uncommitted_line_has_no_blame() {
        let output = format!("{UNCOMMITTED} 3 3 1\nauthor Not Committed Yet\n");
        assert!(parse_porcelain_blame(&output).is_none());
    }

    #[test]
    fn test_parse_shortstat() {
        let stat = parse_shortstat(" 3 files changed, 10 insertions(+), 2 deletions(-)\n").unwrap();
        assert_eq!(
            stat,
            CommitStat {
                files_changed: 3,
                insertions: 10,
                deletions: 2
            }
        );

        let stat = parse_shortstat(" 1 file changed, 1 deletion(-)").unwrap();
        assert_eq!(stat.insertions, 0);
        assert_eq!(stat.deletions, 1);
        assert!(parse_shortstat("").is_none());
    }

    #[test]
    fn test_parse_log_skips_patch_lines() {
        let output = format!(
            "{SENTINEL}a1b2c3d\u{1f}Dana\u{1f}2024-05-01\u{1f}Fix parser\n\ndiff --git a/x b/x\n@@ -1 +1 @@\n{SENTINEL}e4f5a6b\u{1f}Lee\u{1f}2024-04-02\u{1f}Add parser\n"
        );
        let commits = parse_log(&output);
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].hash, "a1b2c3d");
        assert_eq!(commits[1].summary, "Add parser");
    }
}
