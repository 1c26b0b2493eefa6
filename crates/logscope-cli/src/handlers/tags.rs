use crate::commands::Context;
use crate::presentation::views::TagsView;
use anyhow::Result;

pub fn handle(ctx: &Context, query: &str, rescan: bool) -> Result<()> {
    let store = ctx.store();
    let session = store.find_session(query)?;

    let tags = if rescan {
        store.rescan_tags(&session)?.correlation_tags
    } else {
        store.correlation_tags(&session)?
    };

    if ctx.json() {
        println!("{}", serde_json::to_string_pretty(&tags)?);
    } else {
        print!("{}", TagsView::new(&session.id, &tags));
    }
    Ok(())
}
