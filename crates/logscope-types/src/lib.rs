pub mod error;
pub mod fingerprint;
pub mod frame;
pub mod section;
pub mod session;
pub mod task;
pub mod tokens;

pub use error::{Error, Result};
pub use fingerprint::ErrorFingerprint;
pub use frame::{Ecosystem, FrameSummary, SourceRef, StackFrame};
pub use section::*;
pub use session::*;
pub use task::{RequestId, RequestPhase, TaskId, TaskState};
pub use tokens::AnalysisTokens;
