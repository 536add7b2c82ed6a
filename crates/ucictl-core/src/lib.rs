//! Commit, confirm and rollback controller for staged UCI configuration.
//!
//! The [`Controller`] applies a device's staged changes and keeps the
//! operator from locking themselves out: a checked apply must be confirmed
//! within a rollback window, after which the device restores the previous
//! configuration on its own. The controller drives that protocol, reports
//! progress through injected [`surface`] traits, and can wait for a device
//! to come back after a disruptive change.
//!
//! Device access goes through [`CommitBackend`] and [`Probe`], implemented
//! for the HTTP types in `ucictl-api`.

pub mod backend;
pub mod config;
pub mod confirm;
pub mod controller;
mod convert;
pub mod error;
pub mod event;
pub mod model;
pub mod reconnect;
pub mod store;
pub mod surface;

// ── Primary re-exports ──────────────────────────────────────────

pub use backend::{CommitBackend, Probe};
pub use config::{
    CommitTimings, ControllerConfig, DeviceConfig, MIN_ROLLBACK_WINDOW, ReconnectTimings,
    TlsVerification,
};
pub use confirm::{ConfirmLoop, ConfirmOutcome, ConfirmTarget, Terminal};
pub use controller::{ApplyOutcome, ApplyPhase, Controller, FailureReason, RevertOutcome};
pub use error::CoreError;
pub use event::CommitEvent;
pub use model::{ChangeRecord, Changeset, ResolvedChange, SectionRef};
pub use reconnect::ReconnectWaiter;
pub use store::ChangeStore;
pub use surface::{
    Navigator, RecoveryAction, RiskAssessment, RiskChoice, RiskPrompt, Status, StatusKind,
    StatusSink, Surfaces,
};

// Transport types callers need to drive the controller.
pub use ucictl_api::{
    ApplyMode, ConfirmAuth, DEFAULT_API_PREFIX, HttpProbe, Protocol, SessionAuth, TlsMode,
    TransportConfig, UciClient,
};
