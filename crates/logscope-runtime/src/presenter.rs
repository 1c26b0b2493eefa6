use logscope_engine::{ExecutiveSummary, Fragment};
use logscope_types::{RequestId, TaskId};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Everything a request posts to its panel, in posting order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    /// Every task that will run, all pending
    Shell {
        request: RequestId,
        tasks: Vec<TaskId>,
    },
    /// Terminal post for one task: content or a placeholder
    Section {
        request: RequestId,
        fragment: Fragment,
    },
    Notice {
        request: RequestId,
        message: String,
    },
    Trend {
        request: RequestId,
        fragment: Fragment,
    },
    Summary {
        request: RequestId,
        summary: ExecutiveSummary,
    },
    Complete {
        request: RequestId,
    },
}

impl PanelEvent {
    pub fn request(&self) -> RequestId {
        match self {
            PanelEvent::Shell { request, .. }
            | PanelEvent::Section { request, .. }
            | PanelEvent::Notice { request, .. }
            | PanelEvent::Trend { request, .. }
            | PanelEvent::Summary { request, .. }
            | PanelEvent::Complete { request } => *request,
        }
    }
}

/// Consumer of panel events.
///
/// Called with the panel lock held; implementations must not block.
pub trait Presenter: Send + Sync {
    fn post(&self, event: PanelEvent);
}

/// Forwards events to an unbounded channel, for consumers on another task.
pub struct ChannelPresenter {
    sender: UnboundedSender<PanelEvent>,
}

impl ChannelPresenter {
    pub fn new() -> (Self, UnboundedReceiver<PanelEvent>) {
        let (sender, receiver) = unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Presenter for ChannelPresenter {
    fn post(&self, event: PanelEvent) {
        // Receiver dropped: nobody is watching any more
        let _ = self.sender.send(event);
    }
}
