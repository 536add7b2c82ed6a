#![allow(dead_code, clippy::unwrap_used)]
// Shared fakes for controller tests: an in-memory device, a scripted
// reachability probe, and recording front-end surfaces.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use secrecy::ExposeSecret;
use tokio::time::Instant;
use url::Url;

use ucictl_api::ApplyReply;
use ucictl_core::{
    ApplyMode, ChangeRecord, Changeset, CommitBackend, ConfirmAuth, Controller, ControllerConfig,
    CoreError, Navigator, Probe, Protocol, RiskAssessment, RiskChoice, RiskPrompt, Status,
    StatusKind, StatusSink, Surfaces,
};

pub const HOST: &str = "192.0.2.1";

// ── Changeset helpers ───────────────────────────────────────────────

pub fn set(section: &str, option: &str, value: &str) -> ChangeRecord {
    ChangeRecord::Set {
        section: section.into(),
        option: Some(option.into()),
        value: value.into(),
    }
}

/// Three harmless records spread over three files.
pub fn three_changes() -> Changeset {
    let mut cs = Changeset::new();
    cs.extend("network", [set("lan", "mtu", "1400")]);
    cs.extend("system", [set("@system[0]", "hostname", "gw")]);
    cs.extend("dhcp", [set("lan", "leasetime", "12h")]);
    cs
}

// ── Fake device ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FetchChanges,
    InboundInterfaces,
    Apply(ApplyMode),
    /// `None` means session auth.
    Confirm { credential: Option<String> },
    Revert,
}

type ConfirmScript = Box<dyn FnMut(u32, &ConfirmAuth) -> u16 + Send>;

pub struct DeviceState {
    changes: Mutex<Option<Changeset>>,
    interfaces: Mutex<Option<Vec<String>>>,
    apply_reply: Mutex<(u16, Option<String>)>,
    confirm: Mutex<ConfirmScript>,
    confirm_latency: Mutex<Duration>,
    revert_status: Mutex<u16>,
    calls: Mutex<Vec<(Instant, Call)>>,
    confirms: Mutex<u32>,
}

#[derive(Clone)]
pub struct FakeDevice(Arc<DeviceState>);

impl FakeDevice {
    pub fn new() -> Self {
        Self(Arc::new(DeviceState {
            changes: Mutex::new(Some(Changeset::new())),
            interfaces: Mutex::new(Some(Vec::new())),
            apply_reply: Mutex::new((204, None)),
            confirm: Mutex::new(Box::new(|_, _| 403)),
            confirm_latency: Mutex::new(Duration::ZERO),
            revert_status: Mutex::new(200),
            calls: Mutex::new(Vec::new()),
            confirms: Mutex::new(0),
        }))
    }

    pub fn with_changes(self, changes: Changeset) -> Self {
        *self.0.changes.lock().unwrap() = Some(changes);
        self
    }

    /// Make `GET changes` fail.
    pub fn failing_changes(self) -> Self {
        *self.0.changes.lock().unwrap() = None;
        self
    }

    pub fn with_interfaces(self, interfaces: &[&str]) -> Self {
        *self.0.interfaces.lock().unwrap() =
            Some(interfaces.iter().map(|s| (*s).to_owned()).collect());
        self
    }

    /// Make the inbound-interface lookup fail.
    pub fn failing_interfaces(self) -> Self {
        *self.0.interfaces.lock().unwrap() = None;
        self
    }

    pub fn with_apply(self, status: u16, token: Option<&str>) -> Self {
        *self.0.apply_reply.lock().unwrap() = (status, token.map(str::to_owned));
        self
    }

    /// `script(n, auth)` answers the n-th (1-based) confirm call.
    pub fn with_confirm(self, script: impl FnMut(u32, &ConfirmAuth) -> u16 + Send + 'static) -> Self {
        *self.0.confirm.lock().unwrap() = Box::new(script);
        self
    }

    pub fn with_confirm_latency(self, latency: Duration) -> Self {
        *self.0.confirm_latency.lock().unwrap() = latency;
        self
    }

    pub fn with_revert(self, status: u16) -> Self {
        *self.0.revert_status.lock().unwrap() = status;
        self
    }

    pub fn calls(&self) -> Vec<(Instant, Call)> {
        self.0.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.calls.lock().unwrap().iter().filter(|(_, c)| pred(c)).count()
    }

    /// Start instants of confirm calls, optionally filtered by auth kind.
    pub fn confirm_times(&self, session: Option<bool>) -> Vec<Instant> {
        self.0
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(at, c)| match c {
                Call::Confirm { credential } => match session {
                    Some(true) if credential.is_some() => None,
                    Some(false) if credential.is_none() => None,
                    _ => Some(*at),
                },
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.0.calls.lock().unwrap().push((Instant::now(), call));
    }
}

impl CommitBackend for FakeDevice {
    async fn fetch_changes(&self) -> Result<Changeset, CoreError> {
        self.record(Call::FetchChanges);
        self.0
            .changes
            .lock()
            .unwrap()
            .clone()
            .ok_or(CoreError::ConnectionFailed {
                url: format!("https://{HOST}/"),
                reason: "unreachable".into(),
            })
    }

    async fn inbound_interfaces(&self) -> Result<Vec<String>, CoreError> {
        self.record(Call::InboundInterfaces);
        self.0
            .interfaces
            .lock()
            .unwrap()
            .clone()
            .ok_or(CoreError::Timeout { timeout_ms: 1000 })
    }

    async fn apply(&self, mode: ApplyMode) -> Result<ApplyReply, CoreError> {
        self.record(Call::Apply(mode));
        let (status, token) = self.0.apply_reply.lock().unwrap().clone();
        if matches!(status, 200 | 204) {
            if let Some(changes) = self.0.changes.lock().unwrap().as_mut() {
                *changes = Changeset::new();
            }
        }
        Ok(ApplyReply { status, token })
    }

    async fn confirm(&self, auth: &ConfirmAuth, _timeout: Duration) -> Result<u16, CoreError> {
        let credential = match auth {
            ConfirmAuth::Credential(token) => Some(token.expose_secret().to_owned()),
            ConfirmAuth::Session => None,
        };
        self.record(Call::Confirm { credential });

        let latency = *self.0.confirm_latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let n = {
            let mut confirms = self.0.confirms.lock().unwrap();
            *confirms += 1;
            *confirms
        };
        let mut script = self.0.confirm.lock().unwrap();
        Ok((&mut **script)(n, auth))
    }

    async fn revert(&self) -> Result<u16, CoreError> {
        self.record(Call::Revert);
        let status = *self.0.revert_status.lock().unwrap();
        if status == 200 {
            if let Some(changes) = self.0.changes.lock().unwrap().as_mut() {
                *changes = Changeset::new();
            }
        }
        Ok(status)
    }
}

// ── Fake probe ──────────────────────────────────────────────────────

type ProbeScript = Box<dyn FnMut(Protocol, &str, u32) -> bool + Send>;

pub struct ProbeState {
    script: Mutex<ProbeScript>,
    per_target: Mutex<HashMap<(Protocol, String), u32>>,
    calls: Mutex<Vec<(Instant, Protocol, String)>>,
}

#[derive(Clone)]
pub struct FakeProbe(Arc<ProbeState>);

impl FakeProbe {
    /// `script(protocol, host, n)` answers the n-th (1-based) probe of that pair.
    pub fn new(script: impl FnMut(Protocol, &str, u32) -> bool + Send + 'static) -> Self {
        Self(Arc::new(ProbeState {
            script: Mutex::new(Box::new(script)),
            per_target: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }))
    }

    pub fn always(reachable: bool) -> Self {
        Self::new(move |_, _, _| reachable)
    }

    pub fn calls(&self) -> Vec<(Instant, Protocol, String)> {
        self.0.calls.lock().unwrap().clone()
    }
}

impl Probe for FakeProbe {
    async fn probe(&self, protocol: Protocol, host: &str, _timeout: Duration) -> bool {
        self.0
            .calls
            .lock()
            .unwrap()
            .push((Instant::now(), protocol, host.to_owned()));
        let n = {
            let mut per_target = self.0.per_target.lock().unwrap();
            let n = per_target.entry((protocol, host.to_owned())).or_insert(0);
            *n += 1;
            *n
        };
        let mut script = self.0.script.lock().unwrap();
        (&mut **script)(protocol, host, n)
    }
}

// ── Recording surfaces ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shown {
    Status(Status),
    Clear,
    Indicator(usize),
    HideIndicator,
}

#[derive(Default)]
pub struct RecordingSink {
    log: Mutex<Vec<(Instant, Shown)>>,
}

impl RecordingSink {
    pub fn log(&self) -> Vec<(Instant, Shown)> {
        self.log.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<Status> {
        self.log()
            .into_iter()
            .filter_map(|(_, s)| match s {
                Shown::Status(status) => Some(status),
                _ => None,
            })
            .collect()
    }

    pub fn last_status(&self) -> Option<Status> {
        self.statuses().pop()
    }

    pub fn shown_kinds(&self) -> Vec<StatusKind> {
        self.statuses().into_iter().map(|s| s.kind).collect()
    }

    pub fn indicators(&self) -> Vec<Shown> {
        self.log()
            .into_iter()
            .map(|(_, s)| s)
            .filter(|s| matches!(s, Shown::Indicator(_) | Shown::HideIndicator))
            .collect()
    }

    fn push(&self, shown: Shown) {
        self.log.lock().unwrap().push((Instant::now(), shown));
    }
}

impl StatusSink for RecordingSink {
    fn show(&self, status: Status) {
        self.push(Shown::Status(status));
    }

    fn clear(&self) {
        self.push(Shown::Clear);
    }

    fn show_indicator(&self, count: NonZeroUsize) {
        self.push(Shown::Indicator(count.get()));
    }

    fn hide_indicator(&self) {
        self.push(Shown::HideIndicator);
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    reloads: Mutex<Vec<Instant>>,
    navigations: Mutex<Vec<Url>>,
}

impl RecordingNavigator {
    pub fn reloads(&self) -> Vec<Instant> {
        self.reloads.lock().unwrap().clone()
    }

    pub fn navigations(&self) -> Vec<Url> {
        self.navigations.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn reload(&self) {
        self.reloads.lock().unwrap().push(Instant::now());
    }

    fn navigate(&self, url: &Url) {
        self.navigations.lock().unwrap().push(url.clone());
    }
}

pub struct ScriptedPrompt {
    choice: RiskChoice,
    asked: Mutex<Vec<RiskAssessment>>,
}

impl ScriptedPrompt {
    pub fn new(choice: RiskChoice) -> Self {
        Self {
            choice,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<RiskAssessment> {
        self.asked.lock().unwrap().clone()
    }
}

impl RiskPrompt for ScriptedPrompt {
    fn choose(&self, assessment: &RiskAssessment) -> RiskChoice {
        self.asked.lock().unwrap().push(assessment.clone());
        self.choice
    }
}

// ── Harness ─────────────────────────────────────────────────────────

pub struct Harness {
    pub controller: Controller<FakeDevice, FakeProbe>,
    pub device: FakeDevice,
    pub probe: FakeProbe,
    pub sink: Arc<RecordingSink>,
    pub navigator: Arc<RecordingNavigator>,
    pub prompt: Arc<ScriptedPrompt>,
}

pub fn harness(device: FakeDevice, probe: FakeProbe, choice: RiskChoice) -> Harness {
    harness_with(device, probe, choice, ControllerConfig::new(HOST))
}

pub fn harness_with(
    device: FakeDevice,
    probe: FakeProbe,
    choice: RiskChoice,
    config: ControllerConfig,
) -> Harness {
    let sink = Arc::new(RecordingSink::default());
    let navigator = Arc::new(RecordingNavigator::default());
    let prompt = Arc::new(ScriptedPrompt::new(choice));
    let surfaces = Surfaces {
        status: sink.clone(),
        navigator: navigator.clone(),
        risk_prompt: prompt.clone(),
    };
    let controller = Controller::new(device.clone(), probe.clone(), config, surfaces);
    Harness {
        controller,
        device,
        probe,
        sink,
        navigator,
        prompt,
    }
}
