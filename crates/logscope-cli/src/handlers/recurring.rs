use crate::commands::Context;
use crate::presentation::views::RecurringView;
use anyhow::Result;

pub fn handle(ctx: &Context, min_sessions: usize, limit: usize) -> Result<()> {
    let index = ctx.store().aggregate()?;
    let mut records = index.recurring(min_sessions);
    records.truncate(limit);

    if ctx.json() {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print!("{}", RecurringView::new(&records, min_sessions));
    }
    Ok(())
}
