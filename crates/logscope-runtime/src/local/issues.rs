use super::command;
use crate::collaborators::{IssueQuery, IssueTracker};
use crate::{Error, Result};
use async_trait::async_trait;
use logscope_types::{IssueRef, IssueReport, PullRequestRef};
use std::path::PathBuf;

pub const GH_MISSING_HINT: &str =
    "Install the GitHub CLI (gh) to see related pull requests and issues";
pub const GH_AUTH_HINT: &str = "Run `gh auth login` to see related pull requests and issues";
pub const GH_DISABLED_HINT: &str = "Issue tracker lookups are disabled ([issue_tracker] enabled = false)";

const JSON_FIELDS: &str = "number,title,url,state";
const MAX_FILE_PRS: usize = 5;
const MAX_ISSUES: usize = 5;

/// Pull requests and issues through the `gh` executable.
#[derive(Debug, Clone)]
pub struct GhCli {
    enabled: bool,
    cwd: Option<PathBuf>,
}

impl GhCli {
    pub fn new(enabled: bool, cwd: Option<PathBuf>) -> Self {
        Self { enabled, cwd }
    }

    async fn gh(&self, args: &[&str]) -> Result<Option<String>> {
        command::run("gh", args, self.cwd.as_deref()).await
    }

    async fn list<T: serde::de::DeserializeOwned>(
        &self,
        kind: &str,
        search: &str,
        limit: usize,
    ) -> Result<Vec<T>> {
        let limit = limit.to_string();
        let output = self
            .gh(&[
                kind, "list", "--state", "all", "--search", search, "--json", JSON_FIELDS,
                "--limit", limit.as_str(),
            ])
            .await?;
        match output {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    /// `Some(hint)` when gh cannot be used.
    async fn unavailable_reason(&self) -> Option<&'static str> {
        if !self.enabled {
            return Some(GH_DISABLED_HINT);
        }
        match self.gh(&["auth", "status"]).await {
            Ok(Some(_)) => None,
            Ok(None) => Some(GH_MISSING_HINT),
            Err(Error::Command { .. }) => Some(GH_AUTH_HINT),
            Err(err) => {
                tracing::debug!(error = %err, "gh auth status failed");
                Some(GH_MISSING_HINT)
            }
        }
    }
}

#[async_trait]
impl IssueTracker for GhCli {
    async fn lookup(&self, query: &IssueQuery) -> Result<IssueReport> {
        if let Some(hint) = self.unavailable_reason().await {
            return Ok(IssueReport::unavailable(hint));
        }

        let introducing_pr = match &query.blame_commit {
            Some(commit) => self
                .list::<PullRequestRef>("pr", commit, 1)
                .await?
                .into_iter()
                .next(),
            None => None,
        };

        let mut file_prs: Vec<PullRequestRef> = Vec::new();
        for file in &query.files {
            for pr in self.list::<PullRequestRef>("pr", file, MAX_FILE_PRS).await? {
                let seen = file_prs.iter().any(|p| p.number == pr.number)
                    || introducing_pr.as_ref().is_some_and(|p| p.number == pr.number);
                if !seen {
                    file_prs.push(pr);
                }
            }
        }
        file_prs.truncate(MAX_FILE_PRS);

        let issues = if query.error_tokens.is_empty() {
            Vec::new()
        } else {
            let search = query.error_tokens.join(" OR ");
            self.list::<IssueRef>("issue", &search, MAX_ISSUES).await?
        };

        Ok(IssueReport {
            available: true,
            setup_hint: None,
            introducing_pr,
            file_prs,
            issues,
        })
    }
}
