use crate::collaborators::Collaborators;
use crate::config::AnalysisSettings;
use crate::panel::Panel;
use crate::presenter::{PanelEvent, Presenter};
use crate::tasks::{TaskContext, run_task, scan_related};
use futures::future::join_all;
use logscope_core::extract_tokens;
use logscope_engine::{ExecutiveSummary, Fragment, render_section, render_trend, score_sections};
use logscope_sessions::SessionStore;
use logscope_types::{AnalysisTokens, RequestId, RequestPhase, SectionData, TaskId, TaskState};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

pub const NO_TOKENS_NOTICE: &str = "No analyzable tokens in this line";

// Per-kind cap when related lines enrich the token set
const ENRICH_CAP: usize = 10;

/// One line the user asked to analyze.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub line: String,
    /// The log file the line belongs to
    pub file: PathBuf,
    /// 0-based index of the line in `file`
    pub line_index: usize,
}

/// What one request produced, as seen by the caller.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub request: RequestId,
    pub phase: RequestPhase,
    /// Token set after Wave 1 enrichment
    pub tokens: AnalysisTokens,
    pub tasks: BTreeMap<TaskId, TaskState>,
    pub sections: SectionData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ExecutiveSummary>,
}

impl AnalysisOutcome {
    fn cancelled(mut self) -> Self {
        self.phase = RequestPhase::Cancelled;
        self
    }
}

/// Which tasks a token set warrants, in display order.
pub fn plan_tasks(tokens: &AnalysisTokens) -> Vec<TaskId> {
    if tokens.is_empty() {
        return Vec::new();
    }
    let mut tasks = Vec::with_capacity(9);
    if tokens.tag.is_some() {
        tasks.push(TaskId::Related);
    }
    for task in TaskId::WAVE2 {
        let wanted = match task {
            TaskId::Source | TaskId::Files => !tokens.files.is_empty(),
            TaskId::Symbols => !tokens.symbols.is_empty(),
            _ => true,
        };
        if wanted {
            tasks.push(task);
        }
    }
    tasks
}

fn lock_sections(sections: &Mutex<SectionData>) -> std::sync::MutexGuard<'_, SectionData> {
    sections.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Runs analysis requests against one panel, last request wins.
#[derive(Clone)]
pub struct Orchestrator {
    settings: AnalysisSettings,
    collaborators: Collaborators,
    store: SessionStore,
    panel: Arc<Panel>,
}

impl Orchestrator {
    pub fn new(
        settings: AnalysisSettings,
        collaborators: Collaborators,
        store: SessionStore,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            settings,
            collaborators,
            store,
            panel: Arc::new(Panel::new(presenter)),
        }
    }

    pub fn panel(&self) -> &Arc<Panel> {
        &self.panel
    }

    /// Analyze one line. Never fails: the request ends `Complete` or
    /// `Cancelled`, and every announced task gets exactly one terminal post.
    pub async fn analyze(&self, request: AnalysisRequest) -> AnalysisOutcome {
        let request_id = RequestId::new();
        let started = Instant::now();
        let cancel = self.panel.begin(request_id);
        let mut tokens = extract_tokens(&request.line);

        tracing::info!(
            request_id = %request_id,
            file = %request.file.display(),
            line_index = request.line_index,
            fingerprint = %tokens.fingerprint,
            "analysis started"
        );

        let mut outcome = AnalysisOutcome {
            request: request_id,
            phase: RequestPhase::Idle,
            tokens: tokens.clone(),
            tasks: BTreeMap::new(),
            sections: SectionData::default(),
            summary: None,
        };

        if tokens.is_empty() {
            self.panel.post(
                request_id,
                PanelEvent::Notice {
                    request: request_id,
                    message: NO_TOKENS_NOTICE.to_string(),
                },
            );
            self.panel.set_phase(request_id, RequestPhase::Complete);
            outcome.phase = RequestPhase::Complete;
            return outcome;
        }

        let tasks = plan_tasks(&tokens);
        outcome.tasks = tasks.iter().map(|t| (*t, TaskState::Pending)).collect();
        if !self.panel.post_shell(request_id, &tasks) {
            return outcome.cancelled();
        }
        outcome.phase = RequestPhase::ShellBuilt;

        let sections = Mutex::new(SectionData::default());

        if let Some(tag) = tokens.tag.clone()
            && tasks.contains(&TaskId::Related)
        {
            self.panel.set_phase(request_id, RequestPhase::Wave1);
            match self
                .wave1(request_id, &request, &tag, &mut tokens, &cancel, &sections)
                .await
            {
                Some(state) => {
                    outcome.tasks.insert(TaskId::Related, state);
                }
                None => return outcome.cancelled(),
            }
        }
        outcome.tokens = tokens.clone();

        if cancel.is_cancelled() {
            return outcome.cancelled();
        }

        self.panel.set_phase(request_id, RequestPhase::Wave2);
        let ctx = Arc::new(TaskContext {
            request,
            tokens,
            settings: self.settings.clone(),
            collaborators: self.collaborators.clone(),
            store: self.store.clone(),
            cancel: cancel.clone(),
        });
        let settled = join_all(
            tasks
                .iter()
                .filter(|task| **task != TaskId::Related)
                .map(|task| self.settle(request_id, *task, ctx.clone(), &cancel, &sections)),
        )
        .await;
        outcome.tasks.extend(settled);

        if cancel.is_cancelled() {
            tracing::info!(request_id = %request_id, "analysis cancelled");
            return outcome.cancelled();
        }

        self.panel.set_phase(request_id, RequestPhase::Finalizing);
        for task in self.panel.unposted(request_id) {
            self.panel
                .post_section(request_id, TaskState::TimedOut, Fragment::timed_out(task));
            outcome.tasks.insert(task, TaskState::TimedOut);
        }

        let data = lock_sections(&sections).clone();
        self.panel.post(
            request_id,
            PanelEvent::Trend {
                request: request_id,
                fragment: render_trend(data.trend.as_ref()),
            },
        );
        let summary = score_sections(&data, &tasks);
        self.panel.post(
            request_id,
            PanelEvent::Summary {
                request: request_id,
                summary: summary.clone(),
            },
        );

        self.panel.set_phase(request_id, RequestPhase::Complete);
        if !self.panel.post(request_id, PanelEvent::Complete { request: request_id }) {
            return outcome.cancelled();
        }

        tracing::info!(
            request_id = %request_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            tasks = tasks.len(),
            "analysis complete"
        );

        outcome.phase = RequestPhase::Complete;
        outcome.sections = data;
        outcome.summary = Some(summary);
        outcome
    }

    /// Scan for lines sharing the tag. `None` when cancelled.
    async fn wave1(
        &self,
        request_id: RequestId,
        request: &AnalysisRequest,
        tag: &str,
        tokens: &mut AnalysisTokens,
        cancel: &CancellationToken,
        sections: &Mutex<SectionData>,
    ) -> Option<TaskState> {
        self.panel
            .set_task_state(request_id, TaskId::Related, TaskState::Running);

        let path = request.file.clone();
        let tag_owned = tag.to_string();
        let exclude = Some(request.line_index);
        let limit = self.settings.related_line_limit;
        let scan =
            tokio::task::spawn_blocking(move || scan_related(&path, &tag_owned, exclude, limit));

        let result = tokio::select! {
            _ = cancel.cancelled() => return None,
            result = tokio::time::timeout(self.settings.wave1_timeout, scan) => result,
        };

        let (state, fragment) = match result {
            Err(_) => {
                tracing::debug!(request_id = %request_id, tag, "related scan timed out, continuing without enrichment");
                (TaskState::TimedOut, Fragment::timed_out(TaskId::Related))
            }
            Ok(Err(err)) => {
                tracing::warn!(request_id = %request_id, error = %err, "related scan panicked");
                (TaskState::Errored, Fragment::failed(TaskId::Related, err))
            }
            Ok(Ok(Err(err))) => {
                tracing::warn!(request_id = %request_id, error = %err, "related scan failed");
                (TaskState::Errored, Fragment::failed(TaskId::Related, err))
            }
            Ok(Ok(Ok((related, found)))) => {
                for extra in &found {
                    tokens.enrich(extra, ENRICH_CAP);
                }
                let data = SectionData {
                    related: Some(related),
                    ..Default::default()
                };
                let fragment = render_section(TaskId::Related, &data);
                lock_sections(sections).merge(data);
                (TaskState::Done, fragment)
            }
        };

        self.panel.post_section(request_id, state, fragment);
        Some(state)
    }

    /// Run one Wave 2 task to a terminal state and post it.
    ///
    /// The task runs on its own tokio task so a panic stays inside its
    /// `JoinError`. On cancellation the task is aborted and nothing is posted.
    async fn settle(
        &self,
        request_id: RequestId,
        task: TaskId,
        ctx: Arc<TaskContext>,
        cancel: &CancellationToken,
        sections: &Mutex<SectionData>,
    ) -> (TaskId, TaskState) {
        self.panel.set_task_state(request_id, task, TaskState::Running);
        let started = Instant::now();

        let handle = tokio::spawn(run_task(task, ctx));
        let abort = handle.abort_handle();

        let result = tokio::select! {
            _ = cancel.cancelled() => {
                abort.abort();
                return (task, TaskState::Running);
            }
            result = tokio::time::timeout(self.settings.task_timeout, handle) => result,
        };

        let (state, fragment) = match result {
            Err(_) => {
                abort.abort();
                tracing::warn!(request_id = %request_id, %task, "task timed out");
                (TaskState::TimedOut, Fragment::timed_out(task))
            }
            Ok(Err(err)) => {
                let reason = if err.is_panic() { "task panicked" } else { "task aborted" };
                tracing::warn!(request_id = %request_id, %task, reason, "task failed");
                (TaskState::Errored, Fragment::failed(task, reason))
            }
            Ok(Ok(Err(err))) => {
                tracing::warn!(request_id = %request_id, %task, error = %err, "task failed");
                (TaskState::Errored, Fragment::failed(task, &err))
            }
            Ok(Ok(Ok(data))) => {
                let fragment = render_section(task, &data);
                lock_sections(sections).merge(data);
                (TaskState::Done, fragment)
            }
        };

        tracing::debug!(
            request_id = %request_id,
            %task,
            ?state,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "task settled"
        );
        self.panel.post_section(request_id, state, fragment);
        (task, state)
    }
}
