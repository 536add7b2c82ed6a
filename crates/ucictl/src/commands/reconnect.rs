//! `ucictl reconnect` -- wait for the device to answer again.

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use ucictl_core::{Status, StatusKind, StatusSink};

use super::Context;
use crate::cli::{GlobalOpts, ReconnectArgs};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct Reachable<'a> {
    url: &'a str,
}

pub async fn handle(ctx: &Context, args: ReconnectArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let hosts = if args.hosts.is_empty() {
        ctx.reconnect_hosts.clone()
    } else {
        args.hosts
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    ctx.sink.show(Status::new(
        StatusKind::Progress,
        "Waiting for the device to come back…",
    ));
    let result = ctx.controller.await_reconnect(&hosts, &cancel).await;
    interrupt.abort();
    ctx.sink.clear();

    let url = result?;
    let out = output::render_single(
        &global.output,
        &Reachable { url: url.as_str() },
        |r| r.url.to_owned(),
        |r| r.url.to_owned(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
