use crate::Result;
use async_trait::async_trait;
use logscope_sessions::SearchLimits;
use logscope_types::{
    BlameInfo, CommitStat, CrashReport, DocMatch, IssueReport, SourceContext, SourceRef,
    SymbolMatch, TokenMatch,
};
use std::path::Path;
use std::sync::Arc;

/// Locates a referenced file in the workspace and reads context around it.
///
/// A file that cannot be found is `Ok` with [`SourceContext::not_found`].
#[async_trait]
pub trait SourceLookup: Send + Sync {
    async fn lookup(&self, reference: &SourceRef) -> Result<SourceContext>;
}

#[async_trait]
pub trait VersionControl: Send + Sync {
    /// `None` when the file is untracked or the line does not exist.
    async fn blame(&self, path: &Path, line: u32) -> Result<Option<BlameInfo>>;

    async fn commit_stat(&self, commit: &str) -> Result<Option<CommitStat>>;
}

#[async_trait]
pub trait SymbolResolver: Send + Sync {
    async fn resolve(&self, name: &str, limit: usize) -> Result<Vec<SymbolMatch>>;
}

#[async_trait]
pub trait DocsSearch: Send + Sync {
    async fn search(&self, tokens: &[String], limit: usize) -> Result<Vec<DocMatch>>;
}

#[async_trait]
pub trait TokenSearch: Send + Sync {
    async fn search(
        &self,
        token: &str,
        limits: SearchLimits,
        exclude: Option<&Path>,
    ) -> Result<Vec<TokenMatch>>;
}

/// Inputs for an issue tracker lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueQuery {
    /// File names referenced by the line
    pub files: Vec<String>,
    pub error_tokens: Vec<String>,
    /// Commit that last touched the failing line, if known
    pub blame_commit: Option<String>,
}

/// Missing CLI or credentials is `Ok` with [`IssueReport::unavailable`].
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn lookup(&self, query: &IssueQuery) -> Result<IssueReport>;
}

/// Missing configuration is `Ok` with [`CrashReport::unavailable`].
#[async_trait]
pub trait CrashReporter: Send + Sync {
    async fn lookup(&self, error_tokens: &[String]) -> Result<CrashReport>;
}

/// The full set of external collaborators one orchestrator runs against.
#[derive(Clone)]
pub struct Collaborators {
    pub source: Arc<dyn SourceLookup>,
    pub vcs: Arc<dyn VersionControl>,
    pub symbols: Arc<dyn SymbolResolver>,
    pub docs: Arc<dyn DocsSearch>,
    pub tokens: Arc<dyn TokenSearch>,
    pub issues: Arc<dyn IssueTracker>,
    pub crashes: Arc<dyn CrashReporter>,
}
