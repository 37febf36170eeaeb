//! Value classification and rendering
//!
//! A value is analysed once ([`analyze`]) and then rendered in any
//! [`ViewMode`] without re-running detection or decompression.

pub mod classify;
pub mod decompress;
pub mod hex;

use std::fmt;

use thiserror::Error;
use tracing::debug;

pub use classify::{classify, DataType};
pub use decompress::{gunzip, inflate_zlib, DecompressError};
pub use hex::hex_dump;

/// Rendering mode selected in the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewMode {
    #[default]
    Auto,
    Json,
    Hex,
    Text,
}

impl ViewMode {
    /// All modes, in menu order.
    pub const ALL: [ViewMode; 4] = [ViewMode::Auto, ViewMode::Json, ViewMode::Hex, ViewMode::Text];

    /// Viewer shortcut: `J`, `H`, `T`, `A` (either case).
    pub fn from_key(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(ViewMode::Auto),
            'J' => Some(ViewMode::Json),
            'H' => Some(ViewMode::Hex),
            'T' => Some(ViewMode::Text),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Auto => "Auto",
            ViewMode::Json => "JSON",
            ViewMode::Hex => "Hex",
            ViewMode::Text => "Text",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendering failure. Distinct from "the value is not JSON" which Auto
/// mode handles by picking another renderer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
}

/// Cached detection result for one value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    /// Type of the stored bytes
    pub detected: DataType,
    /// Decompressed payload and its type, when `detected` is compressed
    /// and inflation succeeded within the cap
    pub inner: Option<(Vec<u8>, DataType)>,
    /// Why inflation failed, if it did
    pub decompress_error: Option<String>,
}

impl Analysis {
    /// Type of the bytes a reader actually cares about.
    pub fn effective_type(&self) -> DataType {
        match &self.inner {
            Some((_, inner_type)) => *inner_type,
            None => self.detected,
        }
    }

    /// Decompressed bytes if available, otherwise the raw value.
    pub fn payload<'a>(&'a self, raw: &'a [u8]) -> &'a [u8] {
        match &self.inner {
            Some((bytes, _)) => bytes,
            None => raw,
        }
    }
}

/// Classify `data` and, for gzip/zlib, inflate one layer bounded by
/// `max_decompressed` bytes.
pub fn analyze(data: &[u8], max_decompressed: usize) -> Analysis {
    let detected = classify(data);
    let inflated = match detected {
        DataType::Gzip => Some(gunzip(data, max_decompressed)),
        DataType::Zlib => Some(inflate_zlib(data, max_decompressed)),
        _ => None,
    };

    match inflated {
        None => Analysis {
            detected,
            inner: None,
            decompress_error: None,
        },
        Some(Ok(bytes)) => {
            let inner_type = classify(&bytes);
            debug!(
                compressed = data.len(),
                inflated = bytes.len(),
                %detected,
                %inner_type,
                "decompressed value"
            );
            Analysis {
                detected,
                inner: Some((bytes, inner_type)),
                decompress_error: None,
            }
        }
        Some(Err(e)) => {
            debug!(%detected, error = %e, "decompression failed, falling back to hex");
            Analysis {
                detected,
                inner: None,
                decompress_error: Some(e.to_string()),
            }
        }
    }
}

/// Render `data` in `mode` using a previous [`analyze`] result.
///
/// Hex always dumps the stored bytes. JSON and Text work on the
/// decompressed payload when there is one. Auto picks a renderer from the
/// payload type; a payload that is itself compressed is not inflated again.
pub fn render(data: &[u8], analysis: &Analysis, mode: ViewMode) -> Result<String, FormatError> {
    match mode {
        ViewMode::Hex => Ok(hex_dump(data)),
        ViewMode::Json => format_json(analysis.payload(data)),
        ViewMode::Text => Ok(format_text(analysis.payload(data))),
        ViewMode::Auto => Ok(render_auto(
            analysis.payload(data),
            analysis.effective_type(),
        )),
    }
}

/// One-shot [`analyze`] + [`render`].
pub fn format_value(data: &[u8], mode: ViewMode, max_decompressed: usize) -> Result<String, FormatError> {
    render(data, &analyze(data, max_decompressed), mode)
}

fn render_auto(payload: &[u8], kind: DataType) -> String {
    match kind {
        DataType::Json => format_json(payload).unwrap_or_else(|_| format_text(payload)),
        DataType::Text => format_text(payload),
        DataType::Binary | DataType::Gzip | DataType::Zlib => hex_dump(payload),
    }
}

/// Pretty-print JSON with two-space indentation. Object key order is kept.
pub fn format_json(data: &[u8]) -> Result<String, FormatError> {
    let value: serde_json::Value =
        serde_json::from_slice(data).map_err(|e| FormatError::InvalidJson(e.to_string()))?;
    serde_json::to_string_pretty(&value).map_err(|e| FormatError::InvalidJson(e.to_string()))
}

/// Text rendering. Invalid UTF-8 sequences become U+FFFD.
pub fn format_text(data: &[u8]) -> String {
    String::from_utf8_lossy(data).into_owned()
}
