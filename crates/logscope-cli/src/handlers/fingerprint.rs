use crate::commands::Context;
use anyhow::Result;
use logscope_core::{hash, normalize};
use serde_json::json;

pub fn handle(ctx: &Context, text: &str) -> Result<()> {
    let normalized = normalize(text);
    let fingerprint = hash(&normalized);

    if ctx.json() {
        let value = json!({
            "fingerprint": fingerprint,
            "normalized": normalized,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("fingerprint: {}", fingerprint);
        println!("normalized:  {}", normalized);
    }
    Ok(())
}
