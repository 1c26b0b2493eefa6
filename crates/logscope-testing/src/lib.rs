//! Testing infrastructure for logscope integration tests.
//!
//! - `TestWorld`: isolated data, session and workspace directories
//! - `fixtures`: session log text and sample lines
//! - `stubs`: collaborators with scripted behavior and a recording presenter

pub mod fixtures;
pub mod stubs;
pub mod world;

pub use stubs::{Behavior, RecordingPresenter, Seam, StubCollaborators};
pub use world::{CliResult, TestWorld};
