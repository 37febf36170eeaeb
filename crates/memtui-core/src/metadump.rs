//! Key enumeration via `lru_crawler metadump all`
//!
//! The crawler streams one line per item:
//!
//! ```text
//! key=user%3A1 exp=-1 la=1700000000 cas=12 fetch=no cls=1 size=68
//! ...
//! END
//! ```
//!
//! Enumeration runs on its own connection so that a long dump never
//! blocks regular operations on the shared client connection.

use bytes::BytesMut;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::cancel::{run_with_deadline, CancelToken};
use crate::error::{MemtuiError, Result};
use crate::model::KeyRecord;
use crate::protocol::client::{connect_stream, ClientOptions};
use crate::protocol::codec::Request;

/// Result of a metadump: the records read plus the error that ended it early,
/// if any. On timeout the records accumulated so far are kept.
#[derive(Debug, Default)]
pub struct EnumerationOutcome {
    pub records: Vec<KeyRecord>,
    pub error: Option<MemtuiError>,
}

impl EnumerationOutcome {
    /// Successful, complete enumeration.
    pub fn complete(records: Vec<KeyRecord>) -> Self {
        Self {
            records,
            error: None,
        }
    }

    /// True when the dump reached its terminator.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// True when the dump stopped early but produced some records.
    pub fn is_partial(&self) -> bool {
        self.error.is_some() && !self.records.is_empty()
    }
}

/// Stream every key's metadata from the server at `options.addr`.
pub async fn enumerate(options: &ClientOptions, cancel: &CancelToken) -> EnumerationOutcome {
    let mut records = Vec::new();
    let result = run_with_deadline(
        cancel,
        options.enumerate_timeout,
        stream_records(options, &mut records),
    )
    .await;

    match result {
        Ok(()) => {
            info!(keys = records.len(), "key enumeration complete");
            EnumerationOutcome::complete(records)
        }
        Err(error) => {
            warn!(keys = records.len(), error = %error, "key enumeration ended early");
            EnumerationOutcome {
                records,
                error: Some(error),
            }
        }
    }
}

async fn stream_records(options: &ClientOptions, records: &mut Vec<KeyRecord>) -> Result<()> {
    let mut stream = connect_stream(&options.addr, options.connect_timeout).await?;
    let mut request = BytesMut::new();
    Request::MetadumpAll.encode(&mut request);
    debug!(command = Request::MetadumpAll.name(), "streaming keys");
    stream.write_all(&request).await?;

    let mut reader = BufReader::new(stream);
    let mut raw = Vec::with_capacity(256);
    let mut skipped = 0usize;

    loop {
        raw.clear();
        let n = reader.read_until(b'\n', &mut raw).await?;
        if n == 0 {
            return Err(MemtuiError::ConnectionClosed);
        }

        let line = String::from_utf8_lossy(&raw);
        let line = line.trim_end_matches(['\r', '\n']);

        if line == "END" {
            break;
        }
        if is_error_line(line) {
            return Err(MemtuiError::Server(format!("metadump: {}", line)));
        }
        match parse_metadump_line(line) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(skipped, "skipped malformed metadump lines");
    }
    Ok(())
}

fn is_error_line(line: &str) -> bool {
    line == "ERROR"
        || line.starts_with("CLIENT_ERROR")
        || line.starts_with("SERVER_ERROR")
        || line.starts_with("BUSY")
}

/// Parse one `field=value` line. Unknown fields are ignored; a line without
/// a key, with a bare token, or with an unparseable known field yields `None`.
pub fn parse_metadump_line(line: &str) -> Option<KeyRecord> {
    let mut record = KeyRecord::default();
    let mut has_key = false;

    for token in line.split_whitespace() {
        let (field, value) = token.split_once('=')?;
        match field {
            "key" => {
                record.key = decode_key(value);
                has_key = !record.key.is_empty();
            }
            // memcached reports -1 for items that never expire
            "exp" => record.expiration = value.parse::<i64>().ok()?.max(0),
            "la" => record.last_access = value.parse().ok()?,
            "cas" => record.cas = value.parse().ok()?,
            "fetch" => record.fetched = value == "yes",
            "cls" => record.slab_class = value.parse().ok()?,
            "size" => record.size = value.parse().ok()?,
            _ => {}
        }
    }

    has_key.then_some(record)
}

fn decode_key(encoded: &str) -> String {
    match urlencoding::decode(encoded) {
        Ok(key) => key.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(encoded.as_bytes()))
            .into_owned(),
    }
}
