//! cli::commands::review
//!
//! Approve, request changes, or comment as a review.

use anyhow::{bail, Result};

use super::{block_on, open_session};
use crate::cli::Context;
use crate::forge::{ForgeProvider, ReviewDecision, ReviewOutcome};
use crate::ui::output::{self, Verbosity};

/// Run the review command.
pub fn review(ctx: &Context, number: u64, decision: ReviewDecision, message: &str) -> Result<()> {
    if decision != ReviewDecision::Approve && message.trim().is_empty() {
        bail!("A message is required for '{}'.", decision);
    }

    block_on(review_async(ctx, number, decision, message))
}

async fn review_async(
    ctx: &Context,
    number: u64,
    decision: ReviewDecision,
    message: &str,
) -> Result<()> {
    let session = open_session(ctx).await?;
    let outcome = session
        .connection
        .forge
        .submit_review(number, decision, message)
        .await?;

    for line in describe_outcome(session.connection.provider, number, &outcome) {
        output::print(line, Verbosity::from_flags(ctx.quiet, ctx.debug));
    }
    Ok(())
}

fn describe_outcome(provider: ForgeProvider, number: u64, outcome: &ReviewOutcome) -> Vec<String> {
    match outcome {
        ReviewOutcome::Submitted => vec![format!("✔ Review submitted on #{}.", number)],
        ReviewOutcome::ApprovalFallback { reason } => vec![
            format!("{} did not record the approval: {}", provider, reason),
            format!("✔ Message posted on #{} as a comment.", number),
        ],
    }
}
