//! `ucictl revert` -- discard staged changes.

use tracing::warn;
use ucictl_core::RevertOutcome;

use super::{Context, util};
use crate::cli::GlobalOpts;
use crate::error::CliError;

pub async fn handle(ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    // the count only words the prompt; revert goes ahead without it
    let prompt = match ctx.controller.try_load().await {
        Ok(changeset) => format!("Discard {} staged change(s)?", changeset.count()),
        Err(e) => {
            warn!(error = %e, "could not list staged changes");
            "Discard all staged changes?".to_owned()
        }
    };
    if !util::confirm(&prompt, global.yes)? {
        return Ok(());
    }
    run(ctx).await
}

pub(super) async fn run(ctx: &Context) -> Result<(), CliError> {
    match ctx.controller.revert().await? {
        RevertOutcome::Reverted => Ok(()),
        RevertOutcome::Failed { reason } => Err(CliError::CommitFailed {
            operation: "Revert".into(),
            reason: reason.to_string(),
        }),
    }
}
