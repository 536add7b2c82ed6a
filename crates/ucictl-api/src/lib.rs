// ucictl-api: Async HTTP client for the UCI commit/confirm/rollback endpoints

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod probe;
pub mod transport;
mod uci;

pub use auth::{ApplyMode, ConfirmAuth, SessionAuth};
pub use client::{DEFAULT_API_PREFIX, UciClient};
pub use error::Error;
pub use models::{ApplyReply, RawChangeset};
pub use probe::{HttpProbe, Protocol, ReachabilityResult};
pub use transport::{TlsMode, TransportConfig};
