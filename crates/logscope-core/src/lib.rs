// Core text heuristics - pure, total functions over single log lines.
// Everything here is synchronous and allocation-light so the orchestrator can
// call it on the hot path before any task is launched.

pub mod classifier;
pub mod detect;
pub mod error;
pub mod fingerprint;
pub mod frames;
pub mod path;
pub mod tag;
pub mod tokens;

pub use classifier::{is_app_frame, is_framework_frame, match_signature};
pub use detect::is_error_line;
pub use error::{Error, Result};
pub use fingerprint::{fingerprint, hash, normalize};
pub use frames::{extract_frames, find_source_refs, is_frame_line, parse_source_ref};
pub use path::{expand_tilde, normalize_path, resolve_data_dir};
pub use tag::{GENERIC_TAGS, parse_logcat_tag, parse_source_tag, severity_of, strip_prefix};
pub use tokens::{error_types, extract_tokens};
