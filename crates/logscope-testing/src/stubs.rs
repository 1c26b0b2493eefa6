//! Collaborators with scripted behavior, for orchestrator tests.

use async_trait::async_trait;
use logscope_runtime::{
    Collaborators, CrashReporter, DocsSearch, Error, IssueQuery, IssueTracker, PanelEvent,
    Presenter, Result, SourceLookup, SymbolResolver, TokenSearch, VersionControl,
};
use logscope_sessions::SearchLimits;
use logscope_types::{
    BlameInfo, CommitStat, CrashReport, DocMatch, IssueReport, SourceContext, SourceRef,
    SymbolMatch, TokenMatch,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One collaborator seam of [`Collaborators`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Seam {
    Source,
    Vcs,
    Symbols,
    Docs,
    Tokens,
    Issues,
    Crashes,
}

/// How a stubbed seam answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Behavior {
    /// Answer immediately with canned data
    #[default]
    Respond,
    /// Answer after sleeping
    Delay(Duration),
    /// Never answer
    Hang,
    /// Return an error
    Fail,
    /// Panic inside the call
    Panic,
}

/// Builder for a [`Collaborators`] set where every seam is the same stub.
///
/// Canned answers: docs return one match per token, symbols one match per
/// name, everything else is empty, not found or unavailable.
#[derive(Debug, Default)]
pub struct StubCollaborators {
    behaviors: HashMap<Seam, Behavior>,
    calls: Arc<AtomicUsize>,
}

impl StubCollaborators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, seam: Seam, behavior: Behavior) -> Self {
        self.behaviors.insert(seam, behavior);
        self
    }

    /// Counter of collaborator calls made through the built set.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    pub fn build(self) -> Collaborators {
        let stub = Arc::new(Stub {
            behaviors: self.behaviors,
            calls: self.calls,
        });
        Collaborators {
            source: stub.clone(),
            vcs: stub.clone(),
            symbols: stub.clone(),
            docs: stub.clone(),
            tokens: stub.clone(),
            issues: stub.clone(),
            crashes: stub,
        }
    }
}

struct Stub {
    behaviors: HashMap<Seam, Behavior>,
    calls: Arc<AtomicUsize>,
}

impl Stub {
    async fn behave(&self, seam: Seam) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviors.get(&seam).copied().unwrap_or_default() {
            Behavior::Respond => Ok(()),
            Behavior::Delay(duration) => {
                tokio::time::sleep(duration).await;
                Ok(())
            }
            Behavior::Hang => std::future::pending().await,
            Behavior::Fail => Err(Error::Task(format!("stub {:?} failed", seam))),
            Behavior::Panic => panic!("stub {:?} panicked", seam),
        }
    }
}

#[async_trait]
impl SourceLookup for Stub {
    async fn lookup(&self, reference: &SourceRef) -> Result<SourceContext> {
        self.behave(Seam::Source).await?;
        Ok(SourceContext::not_found(reference.clone()))
    }
}

#[async_trait]
impl VersionControl for Stub {
    async fn blame(&self, _path: &Path, _line: u32) -> Result<Option<BlameInfo>> {
        self.behave(Seam::Vcs).await?;
        Ok(None)
    }

    async fn commit_stat(&self, _commit: &str) -> Result<Option<CommitStat>> {
        self.behave(Seam::Vcs).await?;
        Ok(None)
    }
}

#[async_trait]
impl SymbolResolver for Stub {
    async fn resolve(&self, name: &str, _limit: usize) -> Result<Vec<SymbolMatch>> {
        self.behave(Seam::Symbols).await?;
        Ok(vec![SymbolMatch {
            name: name.to_string(),
            kind: "class".to_string(),
            location: SourceRef::new("lib/stub.dart").with_line(1),
        }])
    }
}

#[async_trait]
impl DocsSearch for Stub {
    async fn search(&self, tokens: &[String], limit: usize) -> Result<Vec<DocMatch>> {
        self.behave(Seam::Docs).await?;
        Ok(tokens
            .iter()
            .take(limit)
            .map(|token| DocMatch {
                file: PathBuf::from("README.md"),
                line: 1,
                matched_token: token.clone(),
                line_text: format!("{} explained", token),
            })
            .collect())
    }
}

#[async_trait]
impl TokenSearch for Stub {
    async fn search(
        &self,
        _token: &str,
        _limits: SearchLimits,
        _exclude: Option<&Path>,
    ) -> Result<Vec<TokenMatch>> {
        self.behave(Seam::Tokens).await?;
        Ok(Vec::new())
    }
}

#[async_trait]
impl IssueTracker for Stub {
    async fn lookup(&self, _query: &IssueQuery) -> Result<IssueReport> {
        self.behave(Seam::Issues).await?;
        Ok(IssueReport::unavailable("stub issue tracker"))
    }
}

#[async_trait]
impl CrashReporter for Stub {
    async fn lookup(&self, _error_tokens: &[String]) -> Result<CrashReport> {
        self.behave(Seam::Crashes).await?;
        Ok(CrashReport::unavailable("stub crash reporter"))
    }
}

/// Presenter that keeps every event it receives.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    events: Mutex<Vec<PanelEvent>>,
}

impl RecordingPresenter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<PanelEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Presenter for RecordingPresenter {
    fn post(&self, event: PanelEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}
