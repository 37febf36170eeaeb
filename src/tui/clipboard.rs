//! Clipboard capability.

use parking_lot::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard error: {0}")]
    System(#[from] arboard::Error),
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
}

/// Write-only clipboard used by the copy commands.
pub trait Clipboard: Send + Sync {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// System clipboard using arboard, opened on first use.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Mutex<Option<arboard::Clipboard>>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut guard = self.inner.lock();
        if guard.is_none() {
            *guard = Some(arboard::Clipboard::new()?);
        }
        match guard.as_mut() {
            Some(clipboard) => Ok(clipboard.set_text(text.to_string())?),
            None => Err(ClipboardError::Unavailable("not initialized".to_string())),
        }
    }
}

/// In-process clipboard; keeps everything written to it.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    writes: Mutex<Vec<String>>,
    fail: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clipboard whose writes always fail.
    pub fn failing() -> Self {
        Self {
            writes: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn last(&self) -> Option<String> {
        self.writes.lock().last().cloned()
    }
}

impl Clipboard for MemoryClipboard {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        if self.fail {
            return Err(ClipboardError::Unavailable("no display".to_string()));
        }
        self.writes.lock().push(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_clipboard() {
        let clipboard = MemoryClipboard::new();
        assert!(clipboard.last().is_none());
        clipboard.set_text("one").unwrap();
        clipboard.set_text("two").unwrap();
        assert_eq!(clipboard.last().as_deref(), Some("two"));
    }

    #[test]
    fn test_failing_clipboard() {
        let clipboard = MemoryClipboard::failing();
        let err = clipboard.set_text("x").unwrap_err();
        assert_eq!(err.to_string(), "clipboard unavailable: no display");
    }
}
