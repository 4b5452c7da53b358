//! cli::commands::whoami
//!
//! Verify the stored token for this repository's provider.

use anyhow::Result;

use super::{block_on, open_session};
use crate::cli::Context;

/// Print the authenticated user.
///
/// In quiet mode only the handle is printed, for scripting.
pub fn whoami(ctx: &Context) -> Result<()> {
    block_on(whoami_async(ctx))
}

async fn whoami_async(ctx: &Context) -> Result<()> {
    let session = open_session(ctx).await?;
    let conn = &session.connection;

    if ctx.quiet {
        println!("{}", conn.user);
    } else {
        println!(
            "Logged in to {} as {} ({}).",
            conn.provider,
            conn.user,
            session.repo.slug()
        );
    }
    Ok(())
}
