use crate::collaborators::{Collaborators, IssueQuery};
use crate::config::AnalysisSettings;
use crate::orchestrator::AnalysisRequest;
use crate::{Error, Result};
use futures::future::join_all;
use logscope_core::{extract_tokens, match_signature};
use logscope_sessions::{SearchLimits, SessionStore, related_lines};
use logscope_types::{
    AnalysisTokens, BlameInfo, CommitStat, FileAnalysis, RelatedLines, SectionData,
    SourceSection, SourceRef, TaskId, TrendSection,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

// Search terms sent to cross-session search, most specific first
const MAX_SEARCH_TERMS: usize = 5;
const MAX_ISSUE_FILES: usize = 3;
const MAX_ERROR_TOKENS: usize = 5;

/// Everything a Wave 2 task needs, shared read-only across the fan-out.
pub(crate) struct TaskContext {
    pub request: AnalysisRequest,
    pub tokens: AnalysisTokens,
    pub settings: AnalysisSettings,
    pub collaborators: Collaborators,
    pub store: SessionStore,
    /// Checked between collaborator calls of multi-step tasks
    pub cancel: CancellationToken,
}

/// Lines sharing `tag` plus the tokens extracted from each of them.
pub(crate) fn scan_related(
    path: &Path,
    tag: &str,
    exclude_line: Option<usize>,
    limit: usize,
) -> Result<(RelatedLines, Vec<AnalysisTokens>)> {
    let related = related_lines(path, tag, exclude_line, limit)?;
    let found = related
        .lines
        .iter()
        .map(|line| extract_tokens(&line.text))
        .filter(|tokens| !tokens.is_empty())
        .collect();
    Ok((related, found))
}

pub(crate) async fn run_task(task: TaskId, ctx: Arc<TaskContext>) -> Result<SectionData> {
    match task {
        // Runs before the fan-out so its tokens can enrich the others
        TaskId::Related => Err(Error::Task(
            "related lines are scanned in the first wave".to_string(),
        )),
        TaskId::Source => source(&ctx).await,
        TaskId::Docs => {
            let docs = ctx
                .collaborators
                .docs
                .search(&ctx.tokens.search_terms(), ctx.settings.docs_limit)
                .await?;
            Ok(SectionData {
                docs: Some(docs),
                ..Default::default()
            })
        }
        TaskId::Symbols => symbols(&ctx).await,
        TaskId::Tokens => token_matches(&ctx).await,
        TaskId::Trend => {
            let store = ctx.store.clone();
            let fingerprint = ctx.tokens.fingerprint.clone();
            let record = {
                let fingerprint = fingerprint.clone();
                tokio::task::spawn_blocking(move || store.record_for(&fingerprint)).await??
            };
            Ok(SectionData {
                trend: Some(TrendSection {
                    fingerprint,
                    record,
                }),
                ..Default::default()
            })
        }
        TaskId::Files => files(&ctx).await,
        TaskId::Github => issues(&ctx).await,
        TaskId::Firebase => {
            let crashes = ctx
                .collaborators
                .crashes
                .lookup(&error_tokens(&ctx.tokens))
                .await?;
            Ok(SectionData {
                firebase: Some(crashes),
                ..Default::default()
            })
        }
    }
}

/// The first referenced file outside framework code, else the first at all.
pub(crate) fn primary_file(tokens: &AnalysisTokens) -> Option<&SourceRef> {
    tokens
        .files
        .iter()
        .find(|f| match_signature(&f.path).is_none())
        .or_else(|| tokens.files.first())
}

fn error_tokens(tokens: &AnalysisTokens) -> Vec<String> {
    tokens
        .error_types
        .iter()
        .chain(&tokens.keywords)
        .take(MAX_ERROR_TOKENS)
        .cloned()
        .collect()
}

async fn blame_with_stat(
    collaborators: &Collaborators,
    path: &Path,
    line: u32,
) -> (Option<BlameInfo>, Option<CommitStat>) {
    let blame = match collaborators.vcs.blame(path, line).await {
        Ok(blame) => blame,
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "blame unavailable");
            None
        }
    };
    let Some(commit) = blame.as_ref().map(|b| b.commit.clone()) else {
        return (None, None);
    };
    let stat = match collaborators.vcs.commit_stat(&commit).await {
        Ok(stat) => stat,
        Err(err) => {
            tracing::debug!(commit = %commit, error = %err, "commit stat unavailable");
            None
        }
    };
    (blame, stat)
}

async fn resolve_primary(ctx: &TaskContext) -> Result<Option<(SourceRef, PathBuf)>> {
    let Some(reference) = primary_file(&ctx.tokens) else {
        return Ok(None);
    };
    let context = ctx.collaborators.source.lookup(reference).await?;
    Ok(context.resolved_path.map(|path| (reference.clone(), path)))
}

async fn source(ctx: &TaskContext) -> Result<SectionData> {
    let Some(reference) = primary_file(&ctx.tokens) else {
        return Ok(SectionData::default());
    };
    let context = ctx.collaborators.source.lookup(reference).await?;
    let (blame, blame_stat) = match (&context.resolved_path, reference.line) {
        (Some(path), Some(line)) => blame_with_stat(&ctx.collaborators, path, line).await,
        _ => (None, None),
    };
    Ok(SectionData {
        source: Some(SourceSection {
            context,
            blame,
            blame_stat,
        }),
        ..Default::default()
    })
}

async fn symbols(ctx: &TaskContext) -> Result<SectionData> {
    let limit = ctx.settings.symbol_limit;
    let mut found = Vec::new();
    let mut seen = HashSet::new();
    for name in &ctx.tokens.symbols {
        if found.len() >= limit || ctx.cancel.is_cancelled() {
            break;
        }
        for symbol in ctx.collaborators.symbols.resolve(name, limit).await? {
            if found.len() >= limit {
                break;
            }
            if seen.insert((symbol.name.clone(), symbol.location.to_string())) {
                found.push(symbol);
            }
        }
    }
    Ok(SectionData {
        symbols: Some(found),
        ..Default::default()
    })
}

async fn token_matches(ctx: &TaskContext) -> Result<SectionData> {
    let limits = ctx.settings.search;
    let mut found = Vec::new();
    let mut seen = HashSet::new();
    for term in ctx.tokens.search_terms().into_iter().take(MAX_SEARCH_TERMS) {
        let remaining = limits.max_results.saturating_sub(found.len());
        if remaining == 0 || ctx.cancel.is_cancelled() {
            break;
        }
        let hits = ctx
            .collaborators
            .tokens
            .search(
                &term,
                SearchLimits {
                    max_results: remaining,
                    max_results_per_file: limits.max_results_per_file,
                },
                Some(&ctx.request.file),
            )
            .await?;
        for hit in hits {
            if seen.insert((hit.session.clone(), hit.line_index)) {
                found.push(hit);
            }
        }
    }
    found.truncate(limits.max_results);
    Ok(SectionData {
        tokens: Some(found),
        ..Default::default()
    })
}

async fn files(ctx: &TaskContext) -> Result<SectionData> {
    let references: Vec<&SourceRef> = ctx
        .tokens
        .files
        .iter()
        .take(ctx.settings.max_referenced_files)
        .collect();

    let lookups = references
        .iter()
        .map(|reference| ctx.collaborators.source.lookup(reference));
    let mut analyses = Vec::with_capacity(references.len());
    for (reference, context) in references.iter().zip(join_all(lookups).await) {
        let context = context?;
        analyses.push(FileAnalysis {
            reference: (*reference).clone(),
            exists: context.exists(),
            line_count: context.line_count,
            annotation_count: context.annotations.len(),
            last_commit: context.file_history.first().cloned(),
        });
    }
    Ok(SectionData {
        files: Some(analyses),
        ..Default::default()
    })
}

async fn issues(ctx: &TaskContext) -> Result<SectionData> {
    let blame_commit = match resolve_primary(ctx).await {
        Ok(Some((reference, path))) => match reference.line {
            Some(line) => ctx
                .collaborators
                .vcs
                .blame(&path, line)
                .await
                .ok()
                .flatten()
                .map(|b| b.commit),
            None => None,
        },
        Ok(None) => None,
        Err(err) => {
            tracing::debug!(error = %err, "could not resolve file for blame lookup");
            None
        }
    };

    let mut file_names: Vec<String> = Vec::new();
    for reference in &ctx.tokens.files {
        let name = reference.file_name().to_string();
        if !name.is_empty() && !file_names.contains(&name) {
            file_names.push(name);
        }
    }
    file_names.truncate(MAX_ISSUE_FILES);

    let query = IssueQuery {
        files: file_names,
        error_tokens: error_tokens(&ctx.tokens),
        blame_commit,
    };
    let report = ctx.collaborators.issues.lookup(&query).await?;
    Ok(SectionData {
        github: Some(report),
        ..Default::default()
    })
}
