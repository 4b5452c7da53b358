//! cli::commands::edit
//!
//! Change the title and/or description of a change request.

use anyhow::{bail, Result};

use super::{block_on, open_session};
use crate::cli::Context;
use crate::forge::EditChangeRequest;
use crate::ui::output::{self, Verbosity};

/// Run the edit command.
///
/// Empty values are treated as "leave unchanged"; at least one field must
/// carry a value.
pub fn edit(ctx: &Context, number: u64, title: Option<&str>, body: Option<&str>) -> Result<()> {
    let request = EditChangeRequest {
        number,
        title: title.map(String::from),
        body: body.map(String::from),
    };
    if request.is_empty() {
        bail!("Nothing to change. Pass --title and/or --body.");
    }

    block_on(edit_async(ctx, request))
}

async fn edit_async(ctx: &Context, request: EditChangeRequest) -> Result<()> {
    let session = open_session(ctx).await?;
    let cr = session.connection.forge.edit_change_request(request).await?;

    output::success(
        format!("Updated #{}: {}", cr.number, cr.title),
        Verbosity::from_flags(ctx.quiet, ctx.debug),
    );
    Ok(())
}
