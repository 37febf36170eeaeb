//! Data model shared by the client, the enumerator and the UI.

use bytes::Bytes;

/// Largest value memcached accepts as an exptime offset.
pub const MAX_TTL: i64 = i32::MAX as i64;

/// Key metadata produced by `lru_crawler metadump`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyRecord {
    /// Percent-decoded key
    pub key: String,
    /// Absolute expiry as a unix timestamp, 0 for none
    pub expiration: i64,
    /// Last access as a unix timestamp
    pub last_access: i64,
    /// CAS value reported by the crawler
    pub cas: u64,
    /// Whether the item has been fetched since it was stored
    pub fetched: bool,
    /// Slab class id
    pub slab_class: u32,
    /// Item size in bytes
    pub size: u64,
}

impl KeyRecord {
    /// Record for a key whose metadata is unknown.
    pub fn bare(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    /// Remaining TTL relative to `now`, suitable for an exptime argument.
    pub fn remaining_ttl(&self, now: i64) -> i32 {
        remaining_ttl(self.expiration, now)
    }
}

/// A value fetched with `gets`, carrying the token needed for `cas`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasItem {
    pub key: String,
    pub value: Bytes,
    pub flags: u32,
    /// Remaining seconds, 0 for none
    pub expiration: i32,
    pub cas: u64,
}

/// Convert an absolute expiry into the relative TTL memcached expects.
///
/// Returns 0 when there is no expiry or it has already passed, otherwise
/// the distance to `now` capped at `i32::MAX`.
pub fn remaining_ttl(exp_abs: i64, now: i64) -> i32 {
    if exp_abs == 0 || exp_abs <= now {
        return 0;
    }
    // exp_abs > now, so the difference is positive
    let remaining = exp_abs.saturating_sub(now).min(MAX_TTL);
    remaining as i32
}

/// Current unix time in seconds.
pub fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}
