// Default collaborators backed by the local filesystem and command-line
// tools (git, gh, a configured crash exporter). Each degrades to "not found"
// or "unavailable" when its tool or root is missing.

mod command;
pub mod crash;
pub mod docs;
pub mod git;
pub mod issues;
pub mod search;
pub mod source;
pub mod symbols;
mod walk;

pub use crash::CommandCrashReporter;
pub use docs::DocsScanner;
pub use git::GitCli;
pub use issues::GhCli;
pub use search::SessionTokenSearch;
pub use source::FsSourceLookup;
pub use symbols::SymbolScanner;
pub use walk::IGNORED_DIRS;

use crate::collaborators::Collaborators;
use crate::config::Config;
use logscope_sessions::SessionStore;
use std::sync::Arc;

impl Collaborators {
    /// The default local collaborator set for `config`.
    pub fn local(config: &Config, store: SessionStore) -> Self {
        let workspace = config.workspace_root();
        Self {
            source: Arc::new(FsSourceLookup::new(
                workspace.clone(),
                config.analysis.preview_context_lines,
                config.analysis.history_limit,
            )),
            vcs: Arc::new(GitCli::new(workspace.clone())),
            symbols: Arc::new(SymbolScanner::new(workspace.clone())),
            docs: Arc::new(DocsScanner::new(config.docs_root())),
            tokens: Arc::new(SessionTokenSearch::new(store)),
            issues: Arc::new(GhCli::new(config.issue_tracker.enabled, workspace)),
            crashes: Arc::new(CommandCrashReporter::new(&config.crash_reporting)),
        }
    }
}
