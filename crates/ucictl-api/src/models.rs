// Raw wire types for the UCI endpoints.
//
// Kept deliberately loose: change records arrive as positional JSON arrays
// and are validated into typed records by `ucictl-core`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// `GET changes` body: config name -> ordered positional records.
///
/// Each record is `[op, arg1, arg2, ...]`; arguments are usually strings but
/// the reorder position may arrive as a number.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawChangeset {
    #[serde(default)]
    pub changes: IndexMap<String, Vec<Vec<serde_json::Value>>>,
}

/// `POST apply/rollback-checked` success body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplyToken {
    pub token: String,
}

/// Result of an apply request, before interpretation.
///
/// Which status means success depends on the apply mode, so the client
/// hands the raw status back and lets the controller decide.
#[derive(Debug, Clone)]
pub struct ApplyReply {
    pub status: u16,
    /// Confirmation credential, present when the body carried one.
    pub token: Option<String>,
}

/// `GET interfaces/inbound` body. Older firmware returns a bare array,
/// newer firmware wraps it in an object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum InboundInterfaces {
    Bare(Vec<String>),
    Wrapped { interfaces: Vec<String> },
}

impl From<InboundInterfaces> for Vec<String> {
    fn from(value: InboundInterfaces) -> Self {
        match value {
            InboundInterfaces::Bare(list) | InboundInterfaces::Wrapped { interfaces: list } => list,
        }
    }
}
