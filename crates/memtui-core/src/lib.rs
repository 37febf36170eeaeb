//! # memtui core
//!
//! Everything in memtui that does not touch the terminal: the memcached
//! client, key enumeration, value classification and formatting, batch
//! deletion, validation and configuration.

// ── Protocol ─────────────────────────────────────────────────────────────────

pub mod cancel;
pub mod capability;
pub mod metadump;
pub mod protocol;

// ── Data ─────────────────────────────────────────────────────────────────────

pub mod batch;
pub mod format;
pub mod model;
pub mod validation;

// ── Ambient ──────────────────────────────────────────────────────────────────

pub mod config;
pub mod error;

// ── Public re-exports ────────────────────────────────────────────────────────

pub use cancel::{cancel_pair, CancelHandle, CancelToken};
pub use capability::ServerCapabilities;
pub use config::Config;
pub use error::{MemtuiError, Result, CAS_CONFLICT_MESSAGE};
pub use metadump::EnumerationOutcome;
pub use model::{CasItem, KeyRecord};
pub use protocol::{ClientOptions, ProtocolClient};
