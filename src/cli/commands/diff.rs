//! cli::commands::diff
//!
//! Read-only listing of the files a change request touches.

use anyhow::Result;

use super::{block_on, open_session};
use crate::cli::Context;
use crate::ui::output;

/// Run the diff command.
///
/// Prints `path +added -removed` per file and a totals line; with `patch`,
/// each file's unified diff follows.
pub fn diff(ctx: &Context, number: u64, patch: bool) -> Result<()> {
    block_on(diff_async(ctx, number, patch))
}

async fn diff_async(ctx: &Context, number: u64, patch: bool) -> Result<()> {
    let session = open_session(ctx).await?;
    let files = session.connection.forge.list_file_changes(number).await?;

    println!("{}", output::format_file_changes(&files));
    if patch && !files.is_empty() {
        println!();
        println!("{}", output::format_patches(&files));
    }
    Ok(())
}
