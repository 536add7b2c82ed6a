//! `ucictl changes` -- list staged changes.

use serde::Serialize;
use tabled::Tabled;

use ucictl_core::ResolvedChange;

use super::Context;
use crate::cli::{ChangesArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct StagedChange {
    config: String,
    #[serde(flatten)]
    change: ResolvedChange,
}

#[derive(Tabled)]
struct ChangeRow {
    #[tabled(rename = "Config")]
    config: String,
    #[tabled(rename = "Op")]
    op: String,
    #[tabled(rename = "Change")]
    change: String,
}

impl From<&StagedChange> for ChangeRow {
    fn from(c: &StagedChange) -> Self {
        Self {
            config: c.config.clone(),
            op: c.change.record.op().to_owned(),
            change: c.change.to_string(),
        }
    }
}

pub async fn handle(ctx: &Context, args: &ChangesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let changeset = ctx.controller.try_load().await?;
    let wanted = |name: &str| args.config.as_deref().is_none_or(|c| c == name);

    if args.count {
        let count: usize = changeset
            .configs()
            .filter(|(name, _)| wanted(name))
            .map(|(_, records)| records.len())
            .sum();
        output::print_output(&count.to_string(), global.quiet);
        return Ok(());
    }

    let staged: Vec<StagedChange> = changeset
        .configs()
        .filter(|(name, _)| wanted(name))
        .flat_map(|(name, _)| {
            changeset
                .resolve(name)
                .into_iter()
                .map(move |change| StagedChange {
                    config: name.to_owned(),
                    change,
                })
        })
        .collect();

    if staged.is_empty() && matches!(global.output, OutputFormat::Table) {
        if !global.quiet {
            eprintln!("No staged changes.");
        }
        return Ok(());
    }

    let out = output::render_list(&global.output, &staged, |c| ChangeRow::from(c), |c| {
        format!("{}: {}", c.config, c.change)
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
