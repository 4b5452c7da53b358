//! cli::commands::view
//!
//! Show one change request.

use anyhow::Result;

use super::{block_on, open_session};
use crate::cli::Context;
use crate::ui::output;

/// Run the view command.
pub fn view(ctx: &Context, number: u64) -> Result<()> {
    block_on(view_async(ctx, number))
}

async fn view_async(ctx: &Context, number: u64) -> Result<()> {
    let session = open_session(ctx).await?;
    let cr = session.connection.forge.get_change_request(number).await?;

    if ctx.quiet {
        println!("{}\t{}\t{}", cr.number, cr.state, cr.url);
    } else {
        println!("{}", output::format_change_request(&cr));
    }
    Ok(())
}
