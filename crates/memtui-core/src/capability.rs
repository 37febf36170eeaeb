//! Server capability detection
//!
//! The connection gate: a `stats` probe that must succeed before the UI
//! proceeds, and that tells us whether the server can enumerate keys.

use std::fmt;

use tracing::info;

use crate::cancel::CancelToken;
use crate::error::{MemtuiError, Result};
use crate::protocol::ProtocolClient;

/// First release with `lru_crawler metadump`.
pub const METADUMP_MIN_VERSION: Version = Version::new(1, 4, 31);

/// A `major.minor.patch` server version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse strings such as `1.6.21` or `1.4.31-beta`. Missing components
    /// default to 0.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().split('.');
        let major = leading_number(parts.next()?)?;
        let minor = parts.next().map(leading_number).unwrap_or(Some(0))?;
        let patch = parts.next().map(leading_number).unwrap_or(Some(0))?;
        Some(Self::new(major, minor, patch))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

fn leading_number(s: &str) -> Option<u32> {
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// What the connected server can do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCapabilities {
    /// Raw version string reported by `stats`
    pub version: String,
    /// Whether `lru_crawler metadump` is available
    pub supports_metadump: bool,
}

impl ServerCapabilities {
    /// Derive capabilities from a version string.
    pub fn from_version(version: impl Into<String>) -> Self {
        let version = version.into();
        let supports_metadump = Version::parse(&version)
            .map(|v| v >= METADUMP_MIN_VERSION)
            .unwrap_or(false);
        Self {
            version,
            supports_metadump,
        }
    }
}

/// Probe the server. Any failure is reported as a `Connection` error.
pub async fn detect(client: &ProtocolClient, cancel: &CancelToken) -> Result<ServerCapabilities> {
    let stats = client.stats(cancel).await.map_err(|e| match e {
        MemtuiError::Cancelled => MemtuiError::Cancelled,
        MemtuiError::Connection(msg) => MemtuiError::Connection(msg),
        other => MemtuiError::Connection(format!(
            "probe of {} failed: {}",
            client.addr(),
            other
        )),
    })?;

    let version = stats.get("version").cloned().ok_or_else(|| {
        MemtuiError::Connection(format!(
            "{} did not report a version in stats",
            client.addr()
        ))
    })?;

    let caps = ServerCapabilities::from_version(version);
    info!(
        addr = client.addr(),
        version = %caps.version,
        metadump = caps.supports_metadump,
        "server capabilities detected"
    );
    Ok(caps)
}
