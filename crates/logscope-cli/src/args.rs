use crate::types::{LogLevel, OutputFormat};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "logscope")]
#[command(about = "Correlate error lines across log sessions and analyze them progressively", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Data directory holding config.toml [default: $LOGSCOPE_PATH, then the platform data dir]
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    /// Session corpus root, overriding [sessions] root
    #[arg(long, global = true)]
    pub sessions_dir: Option<PathBuf>,

    /// Source workspace root, overriding [workspace] root
    #[arg(long, global = true)]
    pub workspace_root: Option<PathBuf>,

    #[arg(long, default_value = "plain", global = true)]
    pub format: OutputFormat,

    /// Ignored when RUST_LOG is set
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Analyze one line of a log file, printing sections as they complete")]
    Analyze {
        file: PathBuf,

        /// 0-based index of the line in FILE
        #[arg(long)]
        line: usize,
    },

    #[command(about = "List errors that recur across sessions")]
    Recurring {
        #[arg(long, default_value = "2")]
        min_sessions: usize,

        #[arg(long, default_value = "20")]
        limit: usize,
    },

    #[command(about = "Show the normalized form and fingerprint of an error line")]
    Fingerprint { text: String },

    #[command(about = "Classify the stack frames in a file as app or framework code")]
    Frames { file: PathBuf },

    #[command(about = "Show a session's correlation tags")]
    Tags {
        /// Session id, file path or path suffix
        session: String,

        /// Regenerate the sidecar instead of reading it
        #[arg(long)]
        rescan: bool,
    },
}
