//! Terminal implementations of the controller's presentation surfaces.
//!
//! Progress goes to an `indicatif` spinner on stderr; notices, warnings
//! and errors are printed as single lines. Prompts use `dialoguer` and
//! hide the spinner while they wait for input.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use dialoguer::Select;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use strum::IntoEnumIterator;
use tracing::{debug, warn};
use url::Url;

use ucictl_core::{
    Navigator, Protocol, RecoveryAction, RiskAssessment, RiskChoice, RiskPrompt, Status,
    StatusKind, StatusSink,
};

const TICK: Duration = Duration::from_millis(100);

// ── Status ──────────────────────────────────────────────────────────

pub struct SpinnerSink {
    bar: Mutex<Option<ProgressBar>>,
    staged: AtomicUsize,
    quiet: bool,
    color: bool,
}

impl SpinnerSink {
    pub fn new(quiet: bool, color: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            staged: AtomicUsize::new(0),
            quiet,
            color,
        }
    }

    /// Run `f` with the spinner (if any) hidden.
    pub fn suspend<R>(&self, f: impl FnOnce() -> R) -> R {
        let bar = self.slot().clone();
        match bar {
            Some(bar) => bar.suspend(f),
            None => f(),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<ProgressBar>> {
        self.bar.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn spinner(&self) -> ProgressBar {
        self.slot()
            .get_or_insert_with(|| {
                let template = if self.color {
                    "{spinner:.cyan} {msg}"
                } else {
                    "{spinner} {msg}"
                };
                let style = ProgressStyle::with_template(template)
                    .unwrap_or_else(|_| ProgressStyle::default_spinner());
                let bar = ProgressBar::new_spinner().with_style(style);
                bar.enable_steady_tick(TICK);
                bar
            })
            .clone()
    }

    fn line(&self, status: &Status) -> String {
        let text = &status.message;
        match (status.kind, self.color) {
            (StatusKind::Warning, false) => format!("! {text}"),
            (StatusKind::Error, false) => format!("✗ {text}"),
            (_, false) => format!("• {text}"),
            (StatusKind::Warning, true) => format!("{} {}", "!".yellow(), text.yellow()),
            (StatusKind::Error, true) => format!("{} {}", "✗".red().bold(), text.red().bold()),
            (_, true) => format!("{} {text}", "•".green()),
        }
    }

    /// Record the new count and draw the indicator if it changed.
    fn update_indicator(&self, count: usize) {
        let previous = self.staged.swap(count, Ordering::Relaxed);
        if self.quiet {
            return;
        }
        if let Some(text) = indicator_text(previous, count) {
            let line = self.line(&Status::new(StatusKind::Notice, text));
            self.suspend(|| eprintln!("{line}"));
        }
    }
}

/// Indicator line for a count change, if anything should be drawn.
fn indicator_text(previous: usize, count: usize) -> Option<String> {
    match (previous, count) {
        (p, c) if p == c => None,
        (_, 0) => Some("No staged changes".into()),
        (_, 1) => Some("1 staged change".into()),
        (_, c) => Some(format!("{c} staged changes")),
    }
}

impl StatusSink for SpinnerSink {
    fn show(&self, status: Status) {
        if status.kind == StatusKind::Progress {
            if !self.quiet {
                self.spinner().set_message(status.message);
            }
            return;
        }

        // a line replaces the spinner
        self.clear();
        if self.quiet && status.kind == StatusKind::Notice {
            return;
        }
        eprintln!("{}", self.line(&status));
    }

    fn clear(&self) {
        if let Some(bar) = self.slot().take() {
            bar.finish_and_clear();
        }
    }

    fn show_indicator(&self, count: NonZeroUsize) {
        self.update_indicator(count.get());
    }

    fn hide_indicator(&self) {
        self.update_indicator(0);
    }
}

// ── Navigation ──────────────────────────────────────────────────────

pub struct TerminalNavigator {
    pub quiet: bool,
}

impl Navigator for TerminalNavigator {
    fn reload(&self) {
        debug!("view reload requested");
    }

    fn navigate(&self, url: &Url) {
        if !self.quiet {
            eprintln!("Device is reachable at {url}");
        }
    }
}

// ── Prompts ─────────────────────────────────────────────────────────

pub struct TerminalPrompt {
    pub sink: Arc<SpinnerSink>,
    pub assume_yes: bool,
}

fn protocols(list: &[Protocol]) -> String {
    if list.is_empty() {
        return "no protocol".into();
    }
    list.iter()
        .map(|p| p.to_string().to_uppercase())
        .collect::<Vec<_>>()
        .join(" and ")
}

impl RiskPrompt for TerminalPrompt {
    fn choose(&self, assessment: &RiskAssessment) -> RiskChoice {
        let warning = format!(
            "Staged changes alter the connectivity of {} (this device currently answers over {}). \
             If they cut this client off, an unconfirmed apply is rolled back automatically.",
            assessment.interfaces.join(", "),
            protocols(&assessment.reachable_via),
        );

        if self.assume_yes {
            warn!(interfaces = ?assessment.interfaces, "connectivity risk; applying with rollback");
            return RiskChoice::ApplyChecked;
        }

        let choices: Vec<RiskChoice> = RiskChoice::iter().collect();
        let picked = self.sink.suspend(|| {
            eprintln!("{warning}");
            Select::new()
                .with_prompt("How do you want to proceed?")
                .items(&choices)
                .default(1)
                .interact()
        });

        match picked {
            Ok(idx) => choices.get(idx).copied().unwrap_or(RiskChoice::Cancel),
            Err(e) => {
                warn!(error = %e, "risk prompt unavailable; cancelling");
                RiskChoice::Cancel
            }
        }
    }
}

/// Ask what to do after the device rolled back. `--yes` and
/// non-interactive sessions dismiss.
pub fn choose_recovery(
    sink: &SpinnerSink,
    actions: &[RecoveryAction],
    assume_yes: bool,
) -> RecoveryAction {
    if assume_yes || actions.is_empty() {
        return RecoveryAction::Dismiss;
    }
    let picked = sink.suspend(|| {
        Select::new()
            .with_prompt("What next?")
            .items(actions)
            .default(0)
            .interact()
    });
    match picked {
        Ok(idx) => actions.get(idx).copied().unwrap_or(RecoveryAction::Dismiss),
        Err(e) => {
            debug!(error = %e, "recovery prompt unavailable; dismissing");
            RecoveryAction::Dismiss
        }
    }
}
