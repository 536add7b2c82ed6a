//! Command dispatch: bridges CLI args -> controller calls -> output formatting.

pub mod apply;
pub mod changes;
pub mod config_cmd;
pub mod probe;
pub mod reconnect;
pub mod revert;
pub mod util;

use std::sync::Arc;

use ucictl_core::{Controller, HttpProbe, StatusSink, Surfaces, UciClient};

use crate::cli::{Command, GlobalOpts};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;
use crate::terminal::{SpinnerSink, TerminalNavigator, TerminalPrompt};

pub type DeviceController = Controller<UciClient, HttpProbe>;

/// Everything a device-bound command needs.
pub struct Context {
    pub controller: DeviceController,
    pub reconnect_hosts: Vec<String>,
    pub sink: Arc<SpinnerSink>,
}

impl Context {
    pub fn new(resolved: Resolved, global: &GlobalOpts) -> Result<Self, CliError> {
        let Resolved {
            profile_name,
            device,
            reconnect_hosts,
        } = resolved;
        tracing::debug!(profile = %profile_name, url = %device.url, "resolved device");

        let client = device.client()?;
        let probe = device.probe()?;
        let sink = Arc::new(SpinnerSink::new(
            global.quiet,
            output::should_color(&global.color),
        ));
        let status: Arc<dyn StatusSink> = Arc::<SpinnerSink>::clone(&sink);
        let surfaces = Surfaces {
            status,
            navigator: Arc::new(TerminalNavigator {
                quiet: global.quiet,
            }),
            risk_prompt: Arc::new(TerminalPrompt {
                sink: Arc::clone(&sink),
                assume_yes: global.yes,
            }),
        };
        let controller = Controller::new(client, probe, device.controller_config()?, surfaces);

        Ok(Self {
            controller,
            reconnect_hosts,
            sink,
        })
    }
}

/// Dispatch a device-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Changes(args) => changes::handle(ctx, &args, global).await,
        Command::Apply(args) => apply::handle(ctx, &args, global).await,
        Command::Revert => revert::handle(ctx, global).await,
        Command::Reconnect(args) => reconnect::handle(ctx, args, global).await,
        // Probe, Config and Completions are handled before dispatch
        Command::Probe(_) | Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
