pub mod collaborators;
pub mod config;
pub mod error;
pub mod local;
pub mod orchestrator;
pub mod panel;
pub mod presenter;
mod tasks;

pub use collaborators::{
    Collaborators, CrashReporter, DocsSearch, IssueQuery, IssueTracker, SourceLookup,
    SymbolResolver, TokenSearch, VersionControl,
};
pub use config::{AnalysisSettings, CONFIG_FILE, Config};
pub use error::{Error, Result};
pub use orchestrator::{
    AnalysisOutcome, AnalysisRequest, NO_TOKENS_NOTICE, Orchestrator, plan_tasks,
};
pub use panel::Panel;
pub use presenter::{ChannelPresenter, PanelEvent, Presenter};
