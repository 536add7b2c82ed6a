//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Select};
use secrecy::SecretString;

use ucictl_config::{Config, Profile};
use ucictl_core::DEFAULT_API_PREFIX;

use super::util::prompt_err;
use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::active_profile_name;
use crate::error::CliError;
use crate::output;

const MASK: &str = "********";

fn prompt_secret(label: &str) -> Result<String, CliError> {
    let value = rpassword::prompt_password(label).map_err(prompt_err)?;
    if value.is_empty() {
        return Err(CliError::Validation {
            field: label.trim_end_matches(": ").into(),
            reason: "value cannot be empty".into(),
        });
    }
    Ok(value)
}

fn available(cfg: &Config) -> String {
    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

fn store_session(profile_name: &str, sid: String, token: String) -> Result<(), CliError> {
    ucictl_config::store_secret(profile_name, "sid", &SecretString::from(sid))?;
    ucictl_config::store_secret(profile_name, "token", &SecretString::from(token))?;
    Ok(())
}

/// Replace plaintext secrets for display.
fn mask_secrets(cfg: &mut Config) {
    for profile in cfg.profiles.values_mut() {
        for secret in [&mut profile.sid, &mut profile.token] {
            if secret.is_some() {
                *secret = Some(MASK.into());
            }
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match &args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = ucictl_config::config_path();
            eprintln!("ucictl configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let controller: String = Input::new()
                .with_prompt("Device URL")
                .default("https://192.168.1.1".into())
                .interact_text()
                .map_err(prompt_err)?;

            let api_prefix: String = Input::new()
                .with_prompt("UCI endpoint prefix")
                .default(DEFAULT_API_PREFIX.into())
                .interact_text()
                .map_err(prompt_err)?;

            let insecure = Confirm::new()
                .with_prompt("Accept a self-signed certificate?")
                .default(true)
                .interact()
                .map_err(prompt_err)?;

            let sid = prompt_secret("Session id: ")?;
            let token = prompt_secret("Session token: ")?;

            let store_choices = &[
                "Store in system keyring (recommended)",
                "Save to config file (plaintext)",
            ];
            let store_selection = Select::new()
                .with_prompt("Where to store the session?")
                .items(store_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let (sid, token) = if store_selection == 0 {
                store_session(&profile_name, sid, token)?;
                eprintln!("   ✓ Session stored in system keyring");
                (None, None)
            } else {
                (Some(sid), Some(token))
            };

            let profile = Profile {
                controller,
                api_prefix: (api_prefix != DEFAULT_API_PREFIX).then_some(api_prefix),
                sid,
                token,
                insecure: insecure.then_some(true),
                ..Profile::default()
            };

            let mut cfg = ucictl_config::load_config_or_default();
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());
            ucictl_config::save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: ucictl changes");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let mut cfg = ucictl_config::load_config_or_default();
            mask_secrets(&mut cfg);
            let out = output::render_single(
                &global.output,
                &cfg,
                output::render_yaml,
                |c| {
                    let mut names: Vec<_> = c.profiles.keys().cloned().collect();
                    names.sort();
                    names.join("\n")
                },
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(
                &ucictl_config::config_path().display().to_string(),
                global.quiet,
            );
            Ok(())
        }

        // ── SetSecret ───────────────────────────────────────────────
        ConfigCommand::SetSecret { profile } => {
            let cfg = ucictl_config::load_config_or_default();
            let profile_name = profile
                .clone()
                .unwrap_or_else(|| active_profile_name(global, &cfg));

            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    available: available(&cfg),
                    name: profile_name,
                });
            }

            let sid = prompt_secret("Session id: ")?;
            let token = prompt_secret("Session token: ")?;
            store_session(&profile_name, sid, token)?;

            eprintln!("✓ Session stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}
