//! Batch deletion of selected keys

use std::collections::HashMap;
use std::fmt;

use tracing::{info, warn};

use crate::cancel::CancelToken;
use crate::error::MemtuiError;
use crate::protocol::ProtocolClient;

/// Per-key outcome of a batch delete.
#[derive(Debug, Default)]
pub struct BatchDeleteResult {
    /// Keys removed, in input order
    pub deleted: Vec<String>,
    /// Keys that could not be removed, in input order
    pub failed: Vec<String>,
    /// Failure reason for every key in `failed`
    pub errors: HashMap<String, MemtuiError>,
}

impl BatchDeleteResult {
    pub fn total(&self) -> usize {
        self.deleted.len() + self.failed.len()
    }

    /// Condensed view used for the status line.
    pub fn summary(&self) -> BatchDeleteSummary {
        BatchDeleteSummary {
            total: self.total(),
            deleted_count: self.deleted.len(),
            failed_count: self.failed.len(),
            failed_keys: self.failed.clone(),
        }
    }

    fn fail(&mut self, key: String, error: MemtuiError) {
        self.errors.insert(key.clone(), error);
        self.failed.push(key);
    }
}

/// Counts derived from a [`BatchDeleteResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchDeleteSummary {
    pub total: usize,
    pub deleted_count: usize,
    pub failed_count: usize,
    pub failed_keys: Vec<String>,
}

impl BatchDeleteSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed_count == 0
    }

    pub fn has_errors(&self) -> bool {
        self.failed_count > 0
    }

    /// The key list changed, so it should be reloaded.
    pub fn should_refresh(&self) -> bool {
        self.deleted_count > 0
    }
}

impl fmt::Display for BatchDeleteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total == 0 {
            return f.write_str("No keys to delete");
        }
        if self.all_succeeded() {
            return write!(f, "Successfully deleted {}", plural_keys(self.deleted_count));
        }
        if self.deleted_count == 0 {
            return if self.failed_count == 1 {
                f.write_str("Failed to delete 1 key")
            } else {
                write!(f, "Failed to delete all {} keys", self.failed_count)
            };
        }
        write!(
            f,
            "Deleted {}, {} failed",
            plural_keys(self.deleted_count),
            self.failed_count
        )
    }
}

fn plural_keys(n: usize) -> String {
    if n == 1 {
        "1 key".to_string()
    } else {
        format!("{} keys", n)
    }
}

/// Delete `keys` one at a time, in order. Without a client every key fails
/// with `NotConnected`. Once `cancel` fires the remaining keys fail with
/// `Cancelled` without being sent.
pub async fn batch_delete(
    client: Option<&ProtocolClient>,
    keys: &[String],
    cancel: &CancelToken,
) -> BatchDeleteResult {
    let mut result = BatchDeleteResult::default();

    let Some(client) = client else {
        for key in keys {
            result.fail(key.clone(), MemtuiError::NotConnected);
        }
        return result;
    };

    for key in keys {
        if cancel.is_cancelled() {
            result.fail(key.clone(), MemtuiError::Cancelled);
            continue;
        }
        match client.delete(key, cancel).await {
            Ok(()) => result.deleted.push(key.clone()),
            Err(e) => {
                warn!(key = %key, error = %e, "batch delete: key failed");
                result.fail(key.clone(), e);
            }
        }
    }

    info!(
        deleted = result.deleted.len(),
        failed = result.failed.len(),
        "batch delete finished"
    );
    result
}
