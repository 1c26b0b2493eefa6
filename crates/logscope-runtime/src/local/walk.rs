use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directories that hold build output, dependencies or VCS metadata.
pub const IGNORED_DIRS: &[&str] = &[
    ".git",
    ".dart_tool",
    ".gradle",
    ".idea",
    "Pods",
    "build",
    "node_modules",
    "target",
    "vendor",
];

// Larger files are generated or minified and not worth scanning
pub(crate) const MAX_SCAN_BYTES: u64 = 1024 * 1024;

fn is_ignored(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| IGNORED_DIRS.contains(&name))
}

/// Regular files under `root` with one of `extensions`, in a stable order.
pub(crate) fn files_with_extensions(root: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_ignored(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.metadata().map(|m| m.len() <= MAX_SCAN_BYTES).unwrap_or(false))
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
        })
        .map(|e| e.into_path())
        .collect()
}

/// Find `relative` under `root`: exact join first, then the shortest path
/// ending with the same components, then the shortest with the same file name.
pub(crate) fn locate(root: &Path, relative: &Path) -> Option<PathBuf> {
    let joined = root.join(relative);
    if joined.is_file() {
        return Some(joined);
    }
    let file_name = relative.file_name()?;

    let mut suffix_match: Option<PathBuf> = None;
    let mut name_match: Option<PathBuf> = None;
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_ignored(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == file_name)
    {
        let path = entry.into_path();
        let depth = path.components().count();
        let shorter = |best: &Option<PathBuf>| {
            best.as_ref()
                .is_none_or(|b| depth < b.components().count())
        };
        if path.ends_with(relative) {
            if shorter(&suffix_match) {
                suffix_match = Some(path);
            }
        } else if shorter(&name_match) {
            name_match = Some(path);
        }
    }
    suffix_match.or(name_match)
}

/// `path` relative to `root` with `/` separators, or unchanged outside it.
pub(crate) fn display_relative(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "x\n").unwrap();
    }

    #[test]
    fn test_locate_prefers_suffix_then_shallow() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "app/lib/src/home.dart");
        touch(dir.path(), "app/test/widgets/home.dart");
        touch(dir.path(), "node_modules/pkg/src/home.dart");

        let found = locate(dir.path(), Path::new("src/home.dart")).unwrap();
        assert!(found.ends_with("app/lib/src/home.dart"));

        let found = locate(dir.path(), Path::new("other/home.dart")).unwrap();
        assert!(found.ends_with("app/lib/src/home.dart"));

        assert!(locate(dir.path(), Path::new("missing.dart")).is_none());
    }

    #[test]
    fn test_files_with_extensions_skips_ignored_dirs() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "README.md");
        touch(dir.path(), "doc/guide.MD");
        touch(dir.path(), "build/out.md");
        touch(dir.path(), "lib/main.dart");

        let files: Vec<String> = files_with_extensions(dir.path(), &["md"])
            .iter()
            .map(|p| display_relative(dir.path(), p))
            .collect();
        assert_eq!(files, vec!["README.md", "doc/guide.MD"]);
    }
}
