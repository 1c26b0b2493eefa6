use crate::commands::Context;
use crate::presentation::console::ConsoleEvent;
use anyhow::{Context as _, Result};
use logscope_runtime::{
    AnalysisRequest, AnalysisSettings, ChannelPresenter, Collaborators, Orchestrator,
};
use logscope_sessions::read_log_lines;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

pub fn handle(ctx: &Context, file: PathBuf, line_index: usize) -> Result<()> {
    let lines = read_log_lines(&file).with_context(|| format!("reading {}", file.display()))?;
    let line = lines.get(line_index).cloned().with_context(|| {
        format!(
            "line {} is out of range: {} has {} lines",
            line_index,
            file.display(),
            lines.len()
        )
    })?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(analyze(
        ctx,
        AnalysisRequest {
            line,
            file,
            line_index,
        },
    ))
}

async fn analyze(ctx: &Context, request: AnalysisRequest) -> Result<()> {
    let store = ctx.store();
    let (presenter, mut events) = ChannelPresenter::new();
    let orchestrator = Orchestrator::new(
        AnalysisSettings::from(&ctx.config),
        Collaborators::local(&ctx.config, store.clone()),
        store,
        Arc::new(presenter),
    );

    let plain = !ctx.json();
    let printer = tokio::spawn(async move {
        let color = crate::presentation::stdout_supports_color();
        while let Some(event) = events.recv().await {
            if plain {
                let mut out = std::io::stdout().lock();
                // Reader gone (e.g. piped into `head`): keep draining
                let _ = write!(out, "{}", ConsoleEvent::new(&event, color));
                let _ = out.flush();
            }
        }
    });

    let outcome = {
        let analysis = orchestrator.analyze(request);
        tokio::pin!(analysis);
        tokio::select! {
            outcome = &mut analysis => outcome,
            _ = tokio::signal::ctrl_c() => {
                orchestrator.panel().cancel();
                analysis.await
            }
        }
    };

    // Dropping the orchestrator closes the event channel
    drop(orchestrator);
    printer.await?;

    if ctx.json() {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }
    Ok(())
}
