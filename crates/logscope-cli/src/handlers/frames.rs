use crate::commands::Context;
use crate::presentation::views::FramesView;
use anyhow::{Context as _, Result};
use logscope_core::extract_frames;
use logscope_sessions::read_log_lines;
use logscope_types::FrameSummary;
use serde_json::json;
use std::path::Path;

pub fn handle(ctx: &Context, file: &Path) -> Result<()> {
    let lines = read_log_lines(file).with_context(|| format!("reading {}", file.display()))?;
    let workspace = ctx.config.workspace_root();
    let workspace = workspace.as_ref().and_then(|p| p.to_str());

    let frames = extract_frames(lines.iter().map(String::as_str), workspace);
    let summary = FrameSummary::from_frames(&frames);

    if ctx.json() {
        let value = json!({
            "frames": frames,
            "summary": summary,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!(
            "{}",
            FramesView::new(&frames, summary, crate::presentation::stdout_supports_color())
        );
    }
    Ok(())
}
