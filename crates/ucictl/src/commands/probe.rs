//! `ucictl probe` -- one-off reachability check.

use std::time::Duration;

use serde::Serialize;
use tabled::Tabled;
use tracing::debug;

use ucictl_core::{CoreError, HttpProbe, Protocol, ReconnectTimings, TlsMode, TransportConfig};

use crate::cli::{GlobalOpts, ProbeArgs, ProtocolArg};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Clone, Serialize, Tabled)]
struct ProbeRow {
    #[tabled(rename = "Protocol")]
    protocol: String,
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "Reachable")]
    reachable: bool,
}

/// The profile's transport if one resolves, otherwise flag defaults.
fn build_probe(global: &GlobalOpts) -> Result<(HttpProbe, Duration), CliError> {
    match config::resolve(global) {
        Ok(resolved) => Ok((
            resolved.device.probe()?,
            resolved.device.reconnect.probe_timeout,
        )),
        Err(e) => {
            debug!(error = %e, "no usable profile; probing with defaults");
            let transport = TransportConfig {
                tls: if global.insecure {
                    TlsMode::DangerAcceptInvalid
                } else {
                    TlsMode::System
                },
                timeout: Duration::from_secs(global.timeout.unwrap_or(30)),
                cookie_jar: None,
            };
            let probe = HttpProbe::new(&transport).map_err(CoreError::from)?;
            Ok((probe, ReconnectTimings::default().probe_timeout))
        }
    }
}

pub async fn handle(args: &ProbeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (probe, timeout) = build_probe(global)?;
    let protocols = match args.protocol {
        Some(ProtocolArg::Http) => vec![Protocol::Http],
        Some(ProtocolArg::Https) => vec![Protocol::Https],
        None => Protocol::ALL.to_vec(),
    };

    let mut rows = Vec::with_capacity(protocols.len());
    for protocol in &protocols {
        rows.push(ProbeRow {
            protocol: protocol.to_string(),
            host: args.host.clone(),
            reachable: probe.probe(*protocol, &args.host, timeout).await,
        });
    }

    let out = output::render_list(
        &global.output,
        &rows,
        ProbeRow::clone,
        |r| format!("{}://{} {}", r.protocol, r.host, r.reachable),
    );
    output::print_output(&out, global.quiet);

    if rows.iter().any(|r| r.reachable) {
        Ok(())
    } else {
        Err(CliError::Unreachable {
            host: args.host.clone(),
            protocols: protocols
                .iter()
                .map(|p| p.to_string().to_uppercase())
                .collect::<Vec<_>>()
                .join(" or "),
        })
    }
}
