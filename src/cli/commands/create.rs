//! cli::commands::create
//!
//! Open a pull/merge request.
//!
//! # Design
//!
//! - Arguments are validated before any network call
//! - On success the URL is printed first, then the optional notification
//!   is sent; a notification failure is logged and never fails the command

use anyhow::{bail, Result};

use super::{block_on, open_session};
use crate::cli::Context;
use crate::forge::{ChangeRequest, CreateChangeRequest, Forge};
use crate::notify::Notifier;
use crate::ui::output::{self, Verbosity};

/// Run the create command.
pub fn create(
    ctx: &Context,
    from: &str,
    to: &str,
    title: &str,
    body: &str,
    draft: bool,
) -> Result<()> {
    let request = build_request(from, to, title, body, draft)?;
    block_on(create_async(ctx, request))
}

async fn create_async(ctx: &Context, request: CreateChangeRequest) -> Result<()> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    let session = open_session(ctx).await?;

    let cr = submit(session.connection.forge.as_ref(), request).await?;

    if ctx.quiet {
        println!("{}", cr.url);
    } else {
        output::success(format!("Created #{}: {}", cr.number, cr.url), verbosity);
    }

    if let Some(webhook) = session.config.notification_webhook.as_deref() {
        let sent = match Notifier::new(webhook) {
            Ok(notifier) => notifier.notify_created(&session.repo, &cr).await,
            Err(e) => Err(e),
        };
        match sent {
            Ok(()) => output::print("Notification sent.", verbosity),
            Err(e) => {
                tracing::debug!(error = %e, "notification failed");
                output::warn(format!("notification not sent: {}", e), verbosity);
            }
        }
    }

    Ok(())
}

/// Create the change request on the forge.
pub(crate) async fn submit(
    forge: &dyn Forge,
    request: CreateChangeRequest,
) -> Result<ChangeRequest> {
    tracing::debug!(
        source = %request.source_branch,
        target = %request.target_branch,
        draft = request.draft,
        "creating change request"
    );
    Ok(forge.create_change_request(request).await?)
}

fn build_request(
    from: &str,
    to: &str,
    title: &str,
    body: &str,
    draft: bool,
) -> Result<CreateChangeRequest> {
    let (from, to, title) = (from.trim(), to.trim(), title.trim());

    if from.is_empty() || to.is_empty() {
        bail!("Both --from and --to must name a branch.");
    }
    if from == to {
        bail!("Source and target branch are both '{}'.", from);
    }
    if title.is_empty() {
        bail!("Title cannot be empty.");
    }

    Ok(CreateChangeRequest {
        title: title.to_string(),
        body: body.to_string(),
        source_branch: from.to_string(),
        target_branch: to.to_string(),
        draft,
    })
}
