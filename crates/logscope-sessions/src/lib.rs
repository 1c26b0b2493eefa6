// Session corpus: every captured log file under one root directory.
//
// Nothing here is cached between calls. Aggregation, search and tag
// extraction re-read the corpus each time, so results may lag a file that is
// still being written; callers accept that staleness.

pub mod aggregate;
pub mod error;
pub mod search;
pub mod store;
pub mod tags;

pub use aggregate::RecurringIndex;
pub use error::{Error, Result};
pub use search::{SearchLimits, related_lines};
pub use store::{
    DEFAULT_EXTENSIONS, SIDECAR_SUFFIX, SessionContent, SessionStore, parse_header,
    parse_started_at, read_log_lines, read_session_info, session_id,
};
pub use tags::{MAX_CORRELATION_TAGS, extract_correlation_tags};
