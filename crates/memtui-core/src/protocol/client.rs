//! Memcached client
//!
//! [`ProtocolClient`] owns a single TCP connection guarded by an async
//! mutex, so concurrent callers are serialized and the client can be shared
//! behind an `Arc`. The connection is opened lazily and discarded after any
//! failure (including cancellation and timeouts, where the stream position
//! is unknown); the next call reconnects.

use std::collections::HashMap;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::codec::{parse_response, Request, Response};
use crate::cancel::{run_with_deadline, CancelToken};
use crate::config::ServerConfig;
use crate::error::{MemtuiError, Result};
use crate::metadump::{self, EnumerationOutcome};
use crate::model::CasItem;
use crate::validation::validate_key;

/// Default buffer size (16KB)
const DEFAULT_CONNECTION_BUFFER_SIZE: usize = 16 * 1024;

/// Connection parameters.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// `host:port`
    pub addr: String,
    /// Deadline for establishing a TCP connection
    pub connect_timeout: Duration,
    /// Deadline for a single request/reply exchange
    pub op_timeout: Duration,
    /// Deadline for a full metadump
    pub enumerate_timeout: Duration,
}

impl ClientOptions {
    /// Options with default timeouts for `addr`.
    pub fn new(addr: impl Into<String>) -> Self {
        Self::from_config(&ServerConfig {
            addr: addr.into(),
            ..Default::default()
        })
    }

    /// Options taken from the `[server]` section.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            addr: config.addr.clone(),
            connect_timeout: config.connect_timeout(),
            op_timeout: config.op_timeout(),
            enumerate_timeout: config.enumerate_timeout(),
        }
    }
}

/// Open a TCP stream, failing with `Connection` on refusal or timeout.
pub(crate) async fn connect_stream(addr: &str, timeout: Duration) -> Result<TcpStream> {
    let stream = match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            return Err(MemtuiError::Connection(format!(
                "failed to connect to {}: {}",
                addr, e
            )))
        }
        Err(_) => {
            return Err(MemtuiError::Connection(format!(
                "timed out connecting to {} after {}s",
                addr,
                timeout.as_secs()
            )))
        }
    };
    stream.set_nodelay(true)?;
    debug!(addr, "connected to memcached");
    Ok(stream)
}

/// One buffered connection to the server.
struct Connection {
    stream: TcpStream,
    read_buf: BytesMut,
    write_buf: BytesMut,
}

impl Connection {
    /// Open a buffered connection.
    async fn open(addr: &str, timeout: Duration) -> Result<Self> {
        let stream = connect_stream(addr, timeout).await?;
        Ok(Self {
            stream,
            read_buf: BytesMut::with_capacity(DEFAULT_CONNECTION_BUFFER_SIZE),
            write_buf: BytesMut::with_capacity(DEFAULT_CONNECTION_BUFFER_SIZE),
        })
    }

    async fn write_request(&mut self, request: &Request) -> Result<()> {
        request.encode(&mut self.write_buf);
        self.stream.write_all(&self.write_buf).await?;
        self.write_buf.clear();
        Ok(())
    }

    async fn read_response(&mut self) -> Result<Response> {
        loop {
            if let Some(response) = parse_response(&mut self.read_buf)
                .map_err(|e| MemtuiError::Protocol(e.to_string()))?
            {
                return Ok(response);
            }

            let n = self.stream.read_buf(&mut self.read_buf).await?;
            if n == 0 {
                return Err(MemtuiError::ConnectionClosed);
            }
        }
    }

    /// Send `request` and collect its full reply.
    async fn exchange(&mut self, request: &Request) -> Result<Vec<Response>> {
        self.write_request(request).await?;

        if !request.expects_end() {
            return Ok(vec![self.read_response().await?]);
        }

        let mut responses = Vec::new();
        loop {
            let response = self.read_response().await?;
            let done = response.terminates_sequence();
            responses.push(response);
            if done {
                return Ok(responses);
            }
        }
    }
}

/// Thread-safe memcached client.
pub struct ProtocolClient {
    options: ClientOptions,
    conn: Mutex<Option<Connection>>,
}

impl std::fmt::Debug for ProtocolClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolClient")
            .field("addr", &self.options.addr)
            .finish_non_exhaustive()
    }
}

impl ProtocolClient {
    /// Create a client. No connection is made until the first request.
    pub fn new(options: ClientOptions) -> Self {
        Self {
            options,
            conn: Mutex::new(None),
        }
    }

    /// Server address.
    pub fn addr(&self) -> &str {
        &self.options.addr
    }

    /// Connection parameters.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Run one exchange under the per-op deadline.
    async fn execute(&self, request: Request, cancel: &CancelToken) -> Result<Vec<Response>> {
        debug!(command = request.name(), "memcached request");
        let result = run_with_deadline(cancel, self.options.op_timeout, async {
            let mut guard = self.conn.lock().await;
            // Taken out so that any early exit drops (closes) the stream.
            let mut conn = match guard.take() {
                Some(conn) => conn,
                None => Connection::open(&self.options.addr, self.options.connect_timeout).await?,
            };
            let responses = conn.exchange(&request).await?;
            *guard = Some(conn);
            Ok::<_, MemtuiError>(responses)
        })
        .await;

        if let Err(ref e) = result {
            if !e.is_cancelled() {
                warn!(command = request.name(), error = %e, "memcached request failed");
            }
        }
        result
    }

    async fn execute_single(&self, request: Request, cancel: &CancelToken) -> Result<Response> {
        let name = request.name();
        self.execute(request, cancel)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MemtuiError::Protocol(format!("empty reply to {}", name)))
    }

    /// `version`
    pub async fn version(&self, cancel: &CancelToken) -> Result<String> {
        match self.execute_single(Request::Version, cancel).await? {
            Response::Version(v) => Ok(v),
            other => Err(unexpected("version", other)),
        }
    }

    /// `stats`: the general statistics map.
    pub async fn stats(&self, cancel: &CancelToken) -> Result<HashMap<String, String>> {
        let mut stats = HashMap::new();
        for response in self.execute(Request::Stats, cancel).await? {
            match response {
                Response::Stat { name, value } => {
                    stats.insert(name, value);
                }
                Response::End => {}
                other => return Err(unexpected("stats", other)),
            }
        }
        Ok(stats)
    }

    /// `get <key>`
    pub async fn get(&self, key: &str, cancel: &CancelToken) -> Result<Bytes> {
        check_key(key)?;
        let responses = self
            .execute(
                Request::Get {
                    key: key.to_string(),
                },
                cancel,
            )
            .await?;
        for response in responses {
            match response {
                Response::Value { data, .. } => return Ok(data),
                Response::End => return Err(MemtuiError::KeyNotFound(key.to_string())),
                other => return Err(unexpected("get", other)),
            }
        }
        Err(MemtuiError::KeyNotFound(key.to_string()))
    }

    /// `gets <key>`: value plus CAS token. `expiration` is left at 0 since
    /// the server does not report it; callers fill it from key metadata.
    pub async fn gets(&self, key: &str, cancel: &CancelToken) -> Result<CasItem> {
        check_key(key)?;
        let responses = self
            .execute(
                Request::Gets {
                    key: key.to_string(),
                },
                cancel,
            )
            .await?;
        for response in responses {
            match response {
                Response::Value {
                    data, flags, cas, ..
                } => {
                    let cas = cas.ok_or_else(|| {
                        MemtuiError::Protocol("gets reply without cas token".to_string())
                    })?;
                    return Ok(CasItem {
                        key: key.to_string(),
                        value: data,
                        flags,
                        expiration: 0,
                        cas,
                    });
                }
                Response::End => return Err(MemtuiError::KeyNotFound(key.to_string())),
                other => return Err(unexpected("gets", other)),
            }
        }
        Err(MemtuiError::KeyNotFound(key.to_string()))
    }

    /// `set <key> <flags> <ttl> <bytes>`
    pub async fn set(
        &self,
        key: &str,
        value: Bytes,
        flags: u32,
        ttl: i32,
        cancel: &CancelToken,
    ) -> Result<()> {
        check_key(key)?;
        let request = Request::Set {
            key: key.to_string(),
            flags,
            exptime: ttl,
            value,
        };
        match self.execute_single(request, cancel).await? {
            Response::Stored => Ok(()),
            Response::NotStored => Err(MemtuiError::Server(format!(
                "value for '{}' was not stored",
                key
            ))),
            other => Err(unexpected("set", other)),
        }
    }

    /// `cas`: stores `item.value` only if the token still matches.
    pub async fn compare_and_swap(&self, item: &CasItem, cancel: &CancelToken) -> Result<()> {
        check_key(&item.key)?;
        let request = Request::Cas {
            key: item.key.clone(),
            flags: item.flags,
            exptime: item.expiration,
            value: item.value.clone(),
            cas: item.cas,
        };
        match self.execute_single(request, cancel).await? {
            Response::Stored => Ok(()),
            Response::Exists => Err(MemtuiError::CasConflict),
            Response::NotFound => Err(MemtuiError::KeyNotFound(item.key.clone())),
            other => Err(unexpected("cas", other)),
        }
    }

    /// `delete <key>`
    pub async fn delete(&self, key: &str, cancel: &CancelToken) -> Result<()> {
        check_key(key)?;
        let request = Request::Delete {
            key: key.to_string(),
        };
        match self.execute_single(request, cancel).await? {
            Response::Deleted => Ok(()),
            Response::NotFound => Err(MemtuiError::KeyNotFound(key.to_string())),
            other => Err(unexpected("delete", other)),
        }
    }

    /// `lru_crawler metadump all` over a dedicated connection.
    pub async fn metadump(&self, cancel: &CancelToken) -> EnumerationOutcome {
        metadump::enumerate(&self.options, cancel).await
    }
}

fn check_key(key: &str) -> Result<()> {
    validate_key(key).map_err(|e| MemtuiError::InvalidKey(e.to_string()))
}

fn unexpected(command: &str, response: Response) -> MemtuiError {
    match response {
        Response::Error => MemtuiError::Server(format!("{}: ERROR", command)),
        Response::ClientError(msg) => {
            MemtuiError::Server(format!("{}: CLIENT_ERROR {}", command, msg))
        }
        Response::ServerError(msg) => {
            MemtuiError::Server(format!("{}: SERVER_ERROR {}", command, msg))
        }
        other => MemtuiError::Protocol(format!("unexpected reply to {}: {:?}", command, other)),
    }
}
