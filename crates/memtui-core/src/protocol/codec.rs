//! Memcached text protocol codec (client side)
//!
//! Encodes the handful of requests memtui issues and incrementally parses
//! replies out of a `BytesMut` read buffer.

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Upper bound on a single VALUE payload (memcached's hard item limit is 1 GiB).
pub const MAX_VALUE_BYTES: usize = 1024 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A request sent to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `version`
    Version,
    /// `stats`
    Stats,
    /// `get <key>`
    Get { key: String },
    /// `gets <key>` (with CAS token)
    Gets { key: String },
    /// `set <key> <flags> <exptime> <bytes>\r\n<data>\r\n`
    Set {
        key: String,
        flags: u32,
        exptime: i32,
        value: Bytes,
    },
    /// `cas <key> <flags> <exptime> <bytes> <cas_unique>\r\n<data>\r\n`
    Cas {
        key: String,
        flags: u32,
        exptime: i32,
        value: Bytes,
        cas: u64,
    },
    /// `delete <key>`
    Delete { key: String },
    /// `lru_crawler metadump all`
    MetadumpAll,
}

impl Request {
    /// Command word, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Request::Version => "version",
            Request::Stats => "stats",
            Request::Get { .. } => "get",
            Request::Gets { .. } => "gets",
            Request::Set { .. } => "set",
            Request::Cas { .. } => "cas",
            Request::Delete { .. } => "delete",
            Request::MetadumpAll => "lru_crawler metadump",
        }
    }

    /// Whether the reply is a sequence terminated by `END`.
    pub fn expects_end(&self) -> bool {
        matches!(
            self,
            Request::Stats | Request::Get { .. } | Request::Gets { .. }
        )
    }

    /// Append the wire form of this request to `buf`.
    pub fn encode(&self, buf: &mut BytesMut) {
        match self {
            Request::Version => buf.put_slice(b"version\r\n"),
            Request::Stats => buf.put_slice(b"stats\r\n"),
            Request::Get { key } => put_line(buf, &format!("get {}", key)),
            Request::Gets { key } => put_line(buf, &format!("gets {}", key)),
            Request::Set {
                key,
                flags,
                exptime,
                value,
            } => {
                put_line(
                    buf,
                    &format!("set {} {} {} {}", key, flags, exptime, value.len()),
                );
                buf.put_slice(value);
                buf.put_slice(b"\r\n");
            }
            Request::Cas {
                key,
                flags,
                exptime,
                value,
                cas,
            } => {
                put_line(
                    buf,
                    &format!("cas {} {} {} {} {}", key, flags, exptime, value.len(), cas),
                );
                buf.put_slice(value);
                buf.put_slice(b"\r\n");
            }
            Request::Delete { key } => put_line(buf, &format!("delete {}", key)),
            Request::MetadumpAll => buf.put_slice(b"lru_crawler metadump all\r\n"),
        }
    }
}

fn put_line(buf: &mut BytesMut, line: &str) {
    buf.reserve(line.len() + 2);
    buf.put_slice(line.as_bytes());
    buf.put_slice(b"\r\n");
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// A single reply unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// VALUE block from get/gets
    Value {
        key: String,
        flags: u32,
        data: Bytes,
        cas: Option<u64>,
    },
    /// END (terminates get/gets/stats)
    End,
    /// STORED
    Stored,
    /// NOT_STORED
    NotStored,
    /// EXISTS (CAS conflict)
    Exists,
    /// NOT_FOUND
    NotFound,
    /// DELETED
    Deleted,
    /// VERSION <version>
    Version(String),
    /// STAT <name> <value>
    Stat { name: String, value: String },
    /// ERROR
    Error,
    /// CLIENT_ERROR <message>
    ClientError(String),
    /// SERVER_ERROR <message>
    ServerError(String),
}

impl Response {
    /// Whether this reply ends an exchange that expects `END`.
    pub fn terminates_sequence(&self) -> bool {
        matches!(
            self,
            Response::End | Response::Error | Response::ClientError(_) | Response::ServerError(_)
        )
    }
}

/// Reply parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Malformed reply line
    #[error("invalid reply: {0}")]
    Invalid(String),

    /// VALUE payload larger than [`MAX_VALUE_BYTES`]
    #[error("value too large: {size} bytes (max {max})")]
    ValueTooLarge { size: usize, max: usize },
}

/// Parse one reply from the front of `buf`.
///
/// Returns `Ok(None)` when more bytes are needed; on success the consumed
/// bytes are removed from the buffer.
pub fn parse_response(buf: &mut BytesMut) -> Result<Option<Response>, ParseError> {
    let Some(line_end) = find_crlf(buf) else {
        return Ok(None);
    };

    let line = std::str::from_utf8(&buf[..line_end])
        .map_err(|_| ParseError::Invalid("non-UTF8 reply line".to_string()))?
        .to_string();

    if let Some(header) = line.strip_prefix("VALUE ") {
        let (key, flags, len, cas) = parse_value_header(header)?;
        if len > MAX_VALUE_BYTES {
            return Err(ParseError::ValueTooLarge {
                size: len,
                max: MAX_VALUE_BYTES,
            });
        }
        let data_start = line_end + 2;
        let needed = data_start + len + 2;
        if buf.len() < needed {
            buf.reserve(needed - buf.len());
            return Ok(None);
        }
        if &buf[data_start + len..needed] != b"\r\n" {
            return Err(ParseError::Invalid(format!(
                "VALUE block for '{}' not terminated by CRLF",
                key
            )));
        }
        buf.advance(data_start);
        let data = buf.split_to(len).freeze();
        buf.advance(2);
        return Ok(Some(Response::Value {
            key,
            flags,
            data,
            cas,
        }));
    }

    buf.advance(line_end + 2);
    parse_status_line(&line).map(Some)
}

fn parse_status_line(line: &str) -> Result<Response, ParseError> {
    let response = match line {
        "END" => Response::End,
        "STORED" => Response::Stored,
        "NOT_STORED" => Response::NotStored,
        "EXISTS" => Response::Exists,
        "NOT_FOUND" => Response::NotFound,
        "DELETED" => Response::Deleted,
        "ERROR" => Response::Error,
        _ => {
            if let Some(version) = line.strip_prefix("VERSION ") {
                Response::Version(version.trim().to_string())
            } else if let Some(stat) = line.strip_prefix("STAT ") {
                let (name, value) = stat.split_once(' ').unwrap_or((stat, ""));
                Response::Stat {
                    name: name.to_string(),
                    value: value.to_string(),
                }
            } else if let Some(msg) = line.strip_prefix("CLIENT_ERROR") {
                Response::ClientError(msg.trim().to_string())
            } else if let Some(msg) = line.strip_prefix("SERVER_ERROR") {
                Response::ServerError(msg.trim().to_string())
            } else {
                return Err(ParseError::Invalid(format!("unexpected reply '{}'", line)));
            }
        }
    };
    Ok(response)
}

fn parse_value_header(header: &str) -> Result<(String, u32, usize, Option<u64>), ParseError> {
    let parts: Vec<&str> = header.split_whitespace().collect();
    if parts.len() != 3 && parts.len() != 4 {
        return Err(ParseError::Invalid(format!("bad VALUE header '{}'", header)));
    }
    let flags = parts[1]
        .parse::<u32>()
        .map_err(|_| ParseError::Invalid("invalid flags value".to_string()))?;
    let len = parts[2]
        .parse::<usize>()
        .map_err(|_| ParseError::Invalid("invalid byte count".to_string()))?;
    let cas = match parts.get(3) {
        Some(token) => Some(
            token
                .parse::<u64>()
                .map_err(|_| ParseError::Invalid("invalid cas value".to_string()))?,
        ),
        None => None,
    };
    Ok((parts[0].to_string(), flags, len, cas))
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
