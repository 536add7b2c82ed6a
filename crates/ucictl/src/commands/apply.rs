//! `ucictl apply` -- apply staged changes, then handle a rollback.

use ucictl_core::{ApplyMode, ApplyOutcome, RecoveryAction};

use super::{Context, revert};
use crate::cli::{ApplyArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;
use crate::terminal;

fn plain(outcome: &ApplyOutcome) -> String {
    match outcome {
        ApplyOutcome::Applied { changes } => format!("applied {changes}"),
        ApplyOutcome::RolledBack { .. } => "rolled-back".into(),
        ApplyOutcome::Failed { reason } => format!("failed {reason}"),
    }
}

/// Print the outcome for scripted formats; the status lines already
/// narrate it in table mode.
fn report(outcome: &ApplyOutcome, global: &GlobalOpts) {
    let out = output::render_single(&global.output, outcome, |_| String::new(), plain);
    output::print_output(&out, global.quiet);
}

async fn run(ctx: &Context, mode: ApplyMode, global: &GlobalOpts) -> Result<ApplyOutcome, CliError> {
    let outcome = ctx.controller.apply(mode).await?;
    tracing::debug!(?outcome, "apply finished");
    report(&outcome, global);
    Ok(outcome)
}

pub async fn handle(ctx: &Context, args: &ApplyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    // the risk check reads the store, so fill it first
    ctx.controller.try_load().await?;

    let mode = if args.unchecked {
        ApplyMode::Unchecked
    } else {
        ApplyMode::Checked
    };

    match run(ctx, mode, global).await? {
        ApplyOutcome::Applied { .. } => Ok(()),
        ApplyOutcome::Failed { reason } => Err(CliError::CommitFailed {
            operation: "Apply".into(),
            reason: reason.to_string(),
        }),
        ApplyOutcome::RolledBack { actions } => recover(ctx, &actions, global).await,
    }
}

async fn recover(
    ctx: &Context,
    actions: &[RecoveryAction],
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let action = terminal::choose_recovery(&ctx.sink, actions, global.yes);
    ctx.controller.dismiss();
    tracing::info!(%action, "after rollback");

    match action {
        RecoveryAction::Dismiss => Err(CliError::RolledBack),
        RecoveryAction::RevertChanges => revert::run(ctx).await,
        RecoveryAction::ApplyUnchecked => match run(ctx, ApplyMode::Unchecked, global).await? {
            ApplyOutcome::Applied { .. } => Ok(()),
            ApplyOutcome::Failed { reason } => Err(CliError::CommitFailed {
                operation: "Apply".into(),
                reason: reason.to_string(),
            }),
            ApplyOutcome::RolledBack { .. } => Err(CliError::RolledBack),
        },
    }
}
