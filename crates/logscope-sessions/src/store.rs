use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use logscope_types::SessionInfo;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Suffix of the per-session metadata record written beside a session file.
pub const SIDECAR_SUFFIX: &str = ".meta.json";

pub const DEFAULT_EXTENSIONS: &[&str] = &["log", "txt"];

// A header block longer than this is treated as log content
const HEADER_SCAN_LIMIT: usize = 50;
const DIVIDER_MIN_LEN: usize = 10;

const STARTED_KEYS: &[&str] = &["Started", "Date"];

/// Session file corpus rooted at one directory.
///
/// The store holds no cached state: every query re-enumerates the directory,
/// so concurrent readers never observe a torn index.
#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
    extensions: Vec<String>,
}

/// Log lines of one session, with the header block removed.
#[derive(Debug, Clone, Default)]
pub struct SessionContent {
    /// File line index of `lines[0]`
    pub first_line: usize,
    pub lines: Vec<String>,
}

impl SessionContent {
    /// Lines paired with their index in the file.
    pub fn numbered(&self) -> impl Iterator<Item = (usize, &str)> {
        self.lines
            .iter()
            .enumerate()
            .map(move |(i, line)| (self.first_line + i, line.as_str()))
    }
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_session_file(&self, path: &Path) -> bool {
        if !path.is_file() {
            return false;
        }
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if name.ends_with(SIDECAR_SUFFIX) {
            return false;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    /// Every session under the root, oldest first (ties broken by id).
    ///
    /// A missing root is an empty corpus. Unreadable files and directories
    /// are skipped with a warning.
    pub fn list_sessions(&self) -> Result<Vec<SessionInfo>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut sessions = Vec::new();
        for entry in WalkDir::new(&self.root) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().map(|p| p.display().to_string()).unwrap_or_default();
                    tracing::warn!(path = %path, error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            let path = entry.path();
            if !self.is_session_file(path) {
                continue;
            }
            match read_session_info(&self.root, path) {
                Ok(info) => sessions.push(info),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable session");
                }
            }
        }

        sessions.sort_by(|a, b| {
            a.started_at
                .cmp(&b.started_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(sessions)
    }

    /// Resolve a session by id, file name or path.
    pub fn find_session(&self, query: &str) -> Result<SessionInfo> {
        let as_path = Path::new(query);
        if as_path.is_file() {
            return read_session_info(&self.root, as_path);
        }

        let sessions = self.list_sessions()?;
        let suffix = format!("/{}", query);
        sessions
            .into_iter()
            .find(|s| s.id == query || s.id.ends_with(&suffix))
            .ok_or_else(|| Error::SessionNotFound(query.to_string()))
    }

    pub fn read_content(&self, info: &SessionInfo) -> Result<SessionContent> {
        let lines = read_log_lines(&info.path)?;
        let skip = info.header_lines.min(lines.len());
        Ok(SessionContent {
            first_line: skip,
            lines: lines.into_iter().skip(skip).collect(),
        })
    }
}

/// Read a session file's identity and header without loading its body.
pub fn read_session_info(root: &Path, path: &Path) -> Result<SessionInfo> {
    let head = read_head(path, HEADER_SCAN_LIMIT + 1)?;
    let (header, header_lines) = parse_header(&head);

    let started_at = match STARTED_KEYS
        .iter()
        .find_map(|key| header.get(*key).and_then(|v| parse_started_at(v)))
    {
        Some(ts) => ts,
        None => fs::metadata(path)?
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
    };

    Ok(SessionInfo {
        id: session_id(root, path),
        path: path.to_path_buf(),
        started_at,
        header,
        header_lines,
    })
}

/// Path relative to `root` with `/` separators; absolute display otherwise.
pub fn session_id(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(relative) => relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.display().to_string(),
    }
}

/// All lines of a log file. Invalid UTF-8 is replaced rather than rejected.
pub fn read_log_lines(path: &Path) -> Result<Vec<String>> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes)
        .lines()
        .map(|l| l.to_string())
        .collect())
}

fn read_head(path: &Path, limit: usize) -> Result<Vec<String>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut lines = Vec::new();
    let mut buf = Vec::new();
    while lines.len() < limit {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        lines.push(line.trim_end_matches(['\n', '\r']).to_string());
    }
    Ok(lines)
}

fn is_divider(line: &str) -> bool {
    let line = line.trim();
    line.len() >= DIVIDER_MIN_LEN && line.chars().all(|c| c == '=')
}

fn header_pair(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    let valid_key = !key.is_empty()
        && !key.starts_with(char::is_whitespace)
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'));
    valid_key.then(|| (key.trim(), value.trim()))
}

/// Parse the leading `Key: value` block closed by a `==========` divider.
///
/// Returns the pairs and the number of lines to skip (divider included), or
/// an empty map and zero when the file has no well-formed header.
pub fn parse_header(lines: &[String]) -> (BTreeMap<String, String>, usize) {
    let mut header = BTreeMap::new();
    for (i, line) in lines.iter().enumerate().take(HEADER_SCAN_LIMIT + 1) {
        if is_divider(line) {
            return (header, i + 1);
        }
        if line.trim().is_empty() {
            continue;
        }
        match header_pair(line) {
            Some((key, value)) => {
                header.insert(key.to_string(), value.to_string());
            }
            None => break,
        }
    }
    (BTreeMap::new(), 0)
}

pub fn parse_started_at(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
