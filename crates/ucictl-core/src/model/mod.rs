// ── Domain model ──

pub mod change;
pub mod changeset;

pub use change::{ChangeRecord, ResolvedChange, SectionRef, resolve_sections};
pub use changeset::{CONNECTIVITY_OPTIONS, Changeset, NETWORK_CONFIG};
