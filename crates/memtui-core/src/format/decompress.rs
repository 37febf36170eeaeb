//! Bounded gzip / zlib decompression

use std::io::Read;

use flate2::read::{GzDecoder, ZlibDecoder};
use thiserror::Error;

/// Decompression failures.
#[derive(Debug, Error)]
pub enum DecompressError {
    #[error("decompressed size exceeds {max} bytes")]
    TooLarge { max: usize },

    #[error("corrupt stream: {0}")]
    Corrupt(#[from] std::io::Error),
}

/// Inflate a gzip stream, refusing output larger than `max`.
pub fn gunzip(data: &[u8], max: usize) -> Result<Vec<u8>, DecompressError> {
    read_bounded(GzDecoder::new(data), max)
}

/// Inflate a zlib stream, refusing output larger than `max`.
pub fn inflate_zlib(data: &[u8], max: usize) -> Result<Vec<u8>, DecompressError> {
    read_bounded(ZlibDecoder::new(data), max)
}

fn read_bounded<R: Read>(reader: R, max: usize) -> Result<Vec<u8>, DecompressError> {
    let limit = (max as u64).saturating_add(1);
    let mut out = Vec::new();
    reader.take(limit).read_to_end(&mut out)?;
    if out.len() > max {
        return Err(DecompressError::TooLarge { max });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{GzEncoder, ZlibEncoder};
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_gunzip_roundtrip() {
        let packed = gzip(b"hello world");
        assert_eq!(gunzip(&packed, 1024).unwrap(), b"hello world");
    }

    #[test]
    fn test_inflate_zlib_roundtrip() {
        let packed = zlib(b"{\"a\":1}");
        assert_eq!(inflate_zlib(&packed, 1024).unwrap(), b"{\"a\":1}");
    }

    #[test]
    fn test_cap_enforced() {
        let packed = gzip(&vec![b'a'; 10_000]);
        assert!(matches!(
            gunzip(&packed, 9_999),
            Err(DecompressError::TooLarge { max: 9_999 })
        ));
        assert_eq!(gunzip(&packed, 10_000).unwrap().len(), 10_000);
    }

    #[test]
    fn test_corrupt_stream() {
        assert!(matches!(
            gunzip(&[0x1f, 0x8b, 0x08, 0x00, 0x01], 1024),
            Err(DecompressError::Corrupt(_))
        ));
        assert!(inflate_zlib(&[0x78, 0x9c, 0xff, 0xff], 1024).is_err());
    }
}
