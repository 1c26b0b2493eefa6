use super::walk::{display_relative, files_with_extensions};
use crate::Result;
use crate::collaborators::SymbolResolver;
use async_trait::async_trait;
use logscope_types::{SourceRef, SymbolMatch};
use regex::Regex;
use std::path::{Path, PathBuf};

pub const SOURCE_EXTENSIONS: &[&str] = &[
    "dart", "rs", "ts", "tsx", "js", "jsx", "py", "go", "java", "kt", "swift", "cs", "c", "cc",
    "cpp", "h", "hpp", "m", "rb", "php",
];

const DEFINITION_KEYWORDS: &str =
    "class|struct|enum|trait|interface|mixin|extension|typedef|type|object|protocol|fn|func|fun|def|function";

/// Finds definitions by scanning workspace sources for `<keyword> <name>`.
#[derive(Debug, Clone)]
pub struct SymbolScanner {
    root: Option<PathBuf>,
}

impl SymbolScanner {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }
}

fn definition_pattern(name: &str) -> Option<Regex> {
    Regex::new(&format!(
        r"\b({})\s+{}\b",
        DEFINITION_KEYWORDS,
        regex::escape(name)
    ))
    .ok()
}

pub(crate) fn scan_definitions(root: &Path, name: &str, limit: usize) -> Vec<SymbolMatch> {
    let Some(pattern) = definition_pattern(name) else {
        return Vec::new();
    };
    let mut found = Vec::new();
    for path in files_with_extensions(root, SOURCE_EXTENSIONS) {
        let Ok(bytes) = std::fs::read(&path) else {
            continue;
        };
        let content = String::from_utf8_lossy(&bytes);
        for (index, line) in content.lines().enumerate() {
            if let Some(caps) = pattern.captures(line) {
                found.push(SymbolMatch {
                    name: name.to_string(),
                    kind: caps[1].to_string(),
                    location: SourceRef::new(display_relative(root, &path))
                        .with_line(index as u32 + 1),
                });
                if found.len() >= limit {
                    return found;
                }
            }
        }
    }
    found
}

#[async_trait]
impl SymbolResolver for SymbolScanner {
    async fn resolve(&self, name: &str, limit: usize) -> Result<Vec<SymbolMatch>> {
        let Some(root) = self.root.clone() else {
            return Ok(Vec::new());
        };
        let name = name.to_string();
        Ok(tokio::task::spawn_blocking(move || scan_definitions(&root, &name, limit)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_scan_finds_definitions_not_uses() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("lib")).unwrap();
        std::fs::write(
            dir.path().join("lib/home.dart"),
            "class HomePage extends StatelessWidget {}\nfinal page = HomePage();\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("lib/home_test.rs"),
            "struct HomePageState;\nfn HomePage() {}\n",
        )
        .unwrap();

        let found = scan_definitions(dir.path(), "HomePage", 10);
        let locations: Vec<String> = found.iter().map(|m| m.location.to_string()).collect();
        assert_eq!(locations, vec!["lib/home.dart:1", "lib/home_test.rs:2"]);
        assert_eq!(found[0].kind, "class");
        assert_eq!(found[1].kind, "fn");

        assert_eq!(scan_definitions(dir.path(), "HomePage", 1).len(), 1);
    }
}
