// Engine module - Post-processing of collected sections
// Turns raw collaborator results into presentable fragments and ranks them

pub mod fragment;
pub mod relevance;
pub mod render;
pub mod trend;

pub use fragment::{Fragment, FragmentKind};
pub use relevance::{ExecutiveSummary, RelevanceScore, Signal, score_sections};
pub use render::render_section;
pub use trend::{render_trend, sparkline};
