use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Resolve the data directory (config, caches) based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. LOGSCOPE_PATH environment variable (with tilde expansion)
/// 3. System data directory
/// 4. ~/.logscope
pub fn resolve_data_dir(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var("LOGSCOPE_PATH") {
        return Ok(expand_tilde(&env_path));
    }

    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join("logscope"));
    }

    if let Some(home) = std::env::var_os("HOME") {
        return Ok(PathBuf::from(home).join(".logscope"));
    }

    Err(Error::Config(
        "Could not determine data directory: no HOME directory or system data directory found"
            .to_string(),
    ))
}

/// Expand tilde (~) in paths to the user's home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}

/// Normalize a path for comparison (resolve to absolute, canonicalize if possible)
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_data_dir_wins() {
        let dir = resolve_data_dir(Some("/tmp/logscope-explicit")).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/logscope-explicit"));
    }

    #[test]
    fn test_expand_tilde_leaves_plain_paths() {
        assert_eq!(expand_tilde("/var/log"), PathBuf::from("/var/log"));
        assert_eq!(expand_tilde("relative/dir"), PathBuf::from("relative/dir"));
    }

    #[test]
    fn test_normalize_path_resolves_existing_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let normalized = normalize_path(temp.path());
        assert!(normalized.is_absolute());
        assert!(normalized.exists());
    }
}
