//! Byte blob classification
//!
//! Rules are disjoint and tried in order: empty, gzip magic, zlib header,
//! JSON document, control bytes, text.

use std::fmt;

/// Number of leading bytes inspected for control characters.
pub const SNIFF_LEN: usize = 8 * 1024;

/// Detected content type of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Json,
    Text,
    Binary,
    Gzip,
    Zlib,
}

impl DataType {
    /// Display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Json => "JSON",
            DataType::Text => "Text",
            DataType::Binary => "Binary",
            DataType::Gzip => "Gzip",
            DataType::Zlib => "Zlib",
        }
    }

    /// Whether the value is a compressed container.
    pub fn is_compressed(&self) -> bool {
        matches!(self, DataType::Gzip | DataType::Zlib)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify `data`. Pure and deterministic.
pub fn classify(data: &[u8]) -> DataType {
    if data.is_empty() {
        return DataType::Text;
    }
    if is_gzip(data) {
        return DataType::Gzip;
    }
    if is_zlib(data) {
        return DataType::Zlib;
    }
    if looks_like_json(data) {
        return DataType::Json;
    }
    let sample = &data[..data.len().min(SNIFF_LEN)];
    if sample.iter().any(|&b| is_binary_control(b)) {
        return DataType::Binary;
    }
    DataType::Text
}

fn is_gzip(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b
}

fn is_zlib(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0x78 && matches!(data[1], 0x01 | 0x5e | 0x9c | 0xda)
}

fn looks_like_json(data: &[u8]) -> bool {
    let first = data.iter().find(|b| !b.is_ascii_whitespace());
    matches!(first, Some(b'{') | Some(b'['))
        && serde_json::from_slice::<serde::de::IgnoredAny>(data).is_ok()
}

/// C0 controls other than tab, LF and CR.
fn is_binary_control(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0b | 0x0c | 0x0e..=0x1f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_examples() {
        assert_eq!(classify(br#"{"a":1}"#), DataType::Json);
        assert_eq!(classify(&[0x1f, 0x8b, 0x08, 0x00]), DataType::Gzip);
        assert_eq!(classify(&[0x78, 0x9c, 0x01, 0x02]), DataType::Zlib);
        assert_eq!(classify(b"Hello\nWorld"), DataType::Text);
        assert_eq!(classify(b"\x00\x01\x02"), DataType::Binary);
        assert_eq!(classify(b"  \n[1,2]"), DataType::Json);
    }

    #[test]
    fn test_empty_is_text() {
        assert_eq!(classify(b""), DataType::Text);
    }

    #[test]
    fn test_zlib_header_variants() {
        for second in [0x01u8, 0x5e, 0x9c, 0xda] {
            assert_eq!(classify(&[0x78, second, 0x00]), DataType::Zlib);
        }
        // 'x' followed by an ordinary letter is just text
        assert_eq!(classify(b"xyz"), DataType::Text);
    }

    #[test]
    fn test_invalid_json_falls_through() {
        assert_eq!(classify(b"{not json"), DataType::Text);
        assert_eq!(classify(b"[1,2"), DataType::Text);
        // scalars are valid JSON but not documents
        assert_eq!(classify(b"42"), DataType::Text);
        assert_eq!(classify(br#""str""#), DataType::Text);
    }

    #[test]
    fn test_tabs_and_newlines_are_text() {
        assert_eq!(classify(b"a\tb\r\nc"), DataType::Text);
        assert_eq!(classify(b"a\x0bb"), DataType::Binary);
        assert_eq!(classify(b"a\x1bb"), DataType::Binary);
    }

    #[test]
    fn test_utf8_text() {
        assert_eq!(classify("héllo wörld".as_bytes()), DataType::Text);
    }

    #[test]
    fn test_single_gzip_byte_is_binary() {
        assert_eq!(classify(&[0x1f]), DataType::Binary);
    }

    #[test]
    fn test_data_type_display() {
        assert_eq!(DataType::Json.to_string(), "JSON");
        assert!(DataType::Gzip.is_compressed());
        assert!(!DataType::Binary.is_compressed());
    }
}
