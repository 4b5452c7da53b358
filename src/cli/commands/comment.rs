//! cli::commands::comment
//!
//! Add a general comment to a change request.

use anyhow::{bail, Result};

use super::{block_on, open_session};
use crate::cli::Context;
use crate::ui::output::{self, Verbosity};

/// Run the comment command.
pub fn comment(ctx: &Context, number: u64, message: &str) -> Result<()> {
    if message.trim().is_empty() {
        bail!("Comment cannot be empty.");
    }

    block_on(comment_async(ctx, number, message))
}

async fn comment_async(ctx: &Context, number: u64, message: &str) -> Result<()> {
    let session = open_session(ctx).await?;
    session
        .connection
        .forge
        .add_comment(number, message)
        .await?;

    output::success(
        format!("Comment added to #{}.", number),
        Verbosity::from_flags(ctx.quiet, ctx.debug),
    );
    Ok(())
}
