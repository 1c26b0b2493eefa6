use super::args::{Cli, Commands};
use super::handlers;
use super::logging;
use crate::types::OutputFormat;
use anyhow::Result;
use logscope_core::resolve_data_dir;
use logscope_runtime::{CONFIG_FILE, Config};
use logscope_sessions::SessionStore;
use std::path::PathBuf;

/// Resolved settings shared by every command.
pub struct Context {
    pub data_dir: PathBuf,
    pub config: Config,
    pub format: OutputFormat,
}

impl Context {
    pub fn store(&self) -> SessionStore {
        SessionStore::new(self.config.sessions_root(&self.data_dir))
            .with_extensions(self.config.sessions.extensions.iter().cloned())
    }

    pub fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

pub fn run(cli: Cli) -> Result<()> {
    logging::init(cli.log_level);

    let data_dir = resolve_data_dir(cli.data_dir.as_deref())?;
    let mut config = Config::load_from(&data_dir.join(CONFIG_FILE))?;
    if let Some(root) = cli.sessions_dir {
        config.sessions.root = Some(root);
    }
    if let Some(root) = cli.workspace_root {
        config.workspace.root = Some(root);
    }
    tracing::debug!(data_dir = %data_dir.display(), "configuration loaded");

    let ctx = Context {
        data_dir,
        config,
        format: cli.format,
    };

    match cli.command {
        Commands::Analyze { file, line } => handlers::analyze::handle(&ctx, file, line),
        Commands::Recurring {
            min_sessions,
            limit,
        } => handlers::recurring::handle(&ctx, min_sessions, limit),
        Commands::Fingerprint { text } => handlers::fingerprint::handle(&ctx, &text),
        Commands::Frames { file } => handlers::frames::handle(&ctx, &file),
        Commands::Tags { session, rescan } => handlers::tags::handle(&ctx, &session, rescan),
    }
}
