use crate::presenter::{PanelEvent, Presenter};
use logscope_types::{RequestId, RequestPhase, TaskId, TaskState};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

struct PanelState {
    active: Option<RequestId>,
    token: CancellationToken,
    phase: RequestPhase,
    tasks: BTreeMap<TaskId, TaskState>,
    posted: BTreeSet<TaskId>,
}

/// The surface one stream of analysis requests renders into.
///
/// Holds the only live request and its cancellation token. Every post goes
/// through the same lock that installs a new request, so once a successor
/// has begun, nothing from its predecessor can reach the presenter.
pub struct Panel {
    presenter: Arc<dyn Presenter>,
    state: Mutex<PanelState>,
}

impl Panel {
    pub fn new(presenter: Arc<dyn Presenter>) -> Self {
        Self {
            presenter,
            state: Mutex::new(PanelState {
                active: None,
                token: CancellationToken::new(),
                phase: RequestPhase::Idle,
                tasks: BTreeMap::new(),
                posted: BTreeSet::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PanelState> {
        // Every mutation is a single assignment, so a poisoned guard is still consistent
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cancel whatever is in flight and make `request` the live one.
    pub(crate) fn begin(&self, request: RequestId) -> CancellationToken {
        let mut state = self.lock();
        state.token.cancel();
        if let Some(previous) = state.active {
            tracing::debug!(request_id = %previous, superseded_by = %request, "request superseded");
        }
        let token = CancellationToken::new();
        state.active = Some(request);
        state.token = token.clone();
        state.phase = RequestPhase::Idle;
        state.tasks.clear();
        state.posted.clear();
        token
    }

    /// Post `event` if `request` is still live. Returns whether it was posted.
    pub(crate) fn post(&self, request: RequestId, event: PanelEvent) -> bool {
        let state = self.lock();
        if state.active != Some(request) || state.token.is_cancelled() {
            return false;
        }
        self.presenter.post(event);
        true
    }

    /// Announce the task set and post the shell.
    pub(crate) fn post_shell(&self, request: RequestId, tasks: &[TaskId]) -> bool {
        let mut state = self.lock();
        if state.active != Some(request) || state.token.is_cancelled() {
            return false;
        }
        state.tasks = tasks.iter().map(|t| (*t, TaskState::Pending)).collect();
        state.phase = RequestPhase::ShellBuilt;
        self.presenter.post(PanelEvent::Shell {
            request,
            tasks: tasks.to_vec(),
        });
        true
    }

    /// Record a task's terminal state and post its fragment.
    pub(crate) fn post_section(
        &self,
        request: RequestId,
        state_after: TaskState,
        fragment: logscope_engine::Fragment,
    ) -> bool {
        let mut state = self.lock();
        if state.active != Some(request) || state.token.is_cancelled() {
            return false;
        }
        if let Some(task) = fragment.task {
            // Exactly one terminal post per task
            if !state.posted.insert(task) {
                return false;
            }
            state.tasks.insert(task, state_after);
        }
        self.presenter.post(PanelEvent::Section { request, fragment });
        true
    }

    pub(crate) fn set_task_state(&self, request: RequestId, task: TaskId, task_state: TaskState) {
        let mut state = self.lock();
        if state.active == Some(request) {
            state.tasks.insert(task, task_state);
        }
    }

    pub(crate) fn set_phase(&self, request: RequestId, phase: RequestPhase) {
        let mut state = self.lock();
        if state.active == Some(request) {
            tracing::debug!(request_id = %request, ?phase, "phase");
            state.phase = phase;
        }
    }

    /// Tasks of the live request that have not posted yet.
    pub(crate) fn unposted(&self, request: RequestId) -> Vec<TaskId> {
        let state = self.lock();
        if state.active != Some(request) {
            return Vec::new();
        }
        state
            .tasks
            .keys()
            .filter(|task| !state.posted.contains(task))
            .copied()
            .collect()
    }

    /// Stop the live request, as when the panel is closed.
    pub fn cancel(&self) {
        let mut state = self.lock();
        state.token.cancel();
        if state.active.is_some() && state.phase != RequestPhase::Complete {
            state.phase = RequestPhase::Cancelled;
        }
    }

    pub fn active_request(&self) -> Option<RequestId> {
        self.lock().active
    }

    pub fn phase(&self) -> RequestPhase {
        self.lock().phase
    }

    pub fn task_states(&self) -> BTreeMap<TaskId, TaskState> {
        self.lock().tasks.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::ChannelPresenter;
    use logscope_engine::Fragment;

    #[test]
    fn test_superseded_request_cannot_post() {
        let (presenter, mut rx) = ChannelPresenter::new();
        let panel = Panel::new(Arc::new(presenter));

        let first = RequestId::new();
        let first_token = panel.begin(first);
        assert!(panel.post_shell(first, &[TaskId::Docs]));

        let second = RequestId::new();
        panel.begin(second);
        assert!(first_token.is_cancelled());
        assert!(!panel.post_section(first, TaskState::Done, Fragment::timed_out(TaskId::Docs)));
        assert!(panel.post_shell(second, &[TaskId::Trend]));

        let requests: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.request())
            .collect();
        assert_eq!(requests, vec![first, second]);
        assert_eq!(panel.active_request(), Some(second));
    }

    #[test]
    fn test_one_terminal_post_per_task() {
        let (presenter, mut rx) = ChannelPresenter::new();
        let panel = Panel::new(Arc::new(presenter));
        let request = RequestId::new();
        panel.begin(request);
        panel.post_shell(request, &[TaskId::Docs, TaskId::Tokens]);

        assert!(panel.post_section(request, TaskState::Done, Fragment::empty(TaskId::Docs, "none")));
        assert!(!panel.post_section(request, TaskState::TimedOut, Fragment::timed_out(TaskId::Docs)));
        assert_eq!(panel.unposted(request), vec![TaskId::Tokens]);
        assert_eq!(panel.task_states().get(&TaskId::Docs), Some(&TaskState::Done));

        let count = std::iter::from_fn(|| rx.try_recv().ok()).count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_cancel_stops_posting() {
        let (presenter, _rx) = ChannelPresenter::new();
        let panel = Panel::new(Arc::new(presenter));
        let request = RequestId::new();
        let token = panel.begin(request);

        panel.cancel();
        assert!(token.is_cancelled());
        assert_eq!(panel.phase(), RequestPhase::Cancelled);
        assert!(!panel.post(
            request,
            PanelEvent::Notice {
                request,
                message: "late".into()
            }
        ));
    }
}
