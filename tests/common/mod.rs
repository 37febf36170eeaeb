//! Shared test utilities for memtui integration tests.
//!
//! Import via `mod common;` in integration test files:
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```
//!
//! The centerpiece is [`FakeMemcached`], an in-process server that speaks the
//! subset of the memcached text protocol memtui uses: `version`, `stats`,
//! `get`, `gets`, `set`, `cas`, `delete` and `lru_crawler metadump all`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use memtui::config::Config;
use memtui_core::{ClientOptions, ProtocolClient};

// ============================================================================
// Fake server
// ============================================================================

/// A stored item.
#[derive(Debug, Clone)]
pub struct FakeItem {
    pub value: Vec<u8>,
    pub flags: u32,
    /// Absolute expiry, 0 for none
    pub expiration: i64,
    pub cas: u64,
}

#[derive(Debug)]
struct FakeState {
    items: Mutex<BTreeMap<String, FakeItem>>,
    version: Mutex<String>,
    next_cas: AtomicU64,
    /// Close the connection instead of answering the next request
    drop_next: AtomicBool,
    /// Stop a metadump after this many lines and close the connection
    metadump_limit: Mutex<Option<usize>>,
}

/// In-process memcached stand-in listening on a random local port.
#[derive(Debug, Clone)]
pub struct FakeMemcached {
    addr: String,
    state: Arc<FakeState>,
}

#[allow(dead_code)]
impl FakeMemcached {
    /// Start a server reporting version 1.6.21.
    pub async fn start() -> Self {
        Self::start_with_version("1.6.21").await
    }

    /// Start a server reporting `version` from `version` and `stats`.
    pub async fn start_with_version(version: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("should bind to random port");
        let addr = listener
            .local_addr()
            .expect("should have local addr")
            .to_string();

        let state = Arc::new(FakeState {
            items: Mutex::new(BTreeMap::new()),
            version: Mutex::new(version.to_string()),
            next_cas: AtomicU64::new(1),
            drop_next: AtomicBool::new(false),
            metadump_limit: Mutex::new(None),
        });

        let accept_state = state.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = accept_state.clone();
                tokio::spawn(async move {
                    let _ = handle_connection(stream, state).await;
                });
            }
        });

        Self { addr, state }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Client options pointing at this server with short timeouts.
    pub fn options(&self) -> ClientOptions {
        let mut options = ClientOptions::new(self.addr.clone());
        options.connect_timeout = Duration::from_secs(2);
        options.op_timeout = Duration::from_secs(2);
        options.enumerate_timeout = Duration::from_secs(2);
        options
    }

    pub fn client(&self) -> ProtocolClient {
        ProtocolClient::new(self.options())
    }

    /// Application config pointing at this server.
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.server.addr = self.addr.clone();
        config.server.connect_timeout_secs = 2;
        config.server.op_timeout_secs = 2;
        config.server.enumerate_timeout_secs = 2;
        config
    }

    /// Store `value` under `key` without expiry, as another client would.
    pub fn insert(&self, key: &str, value: &[u8]) -> u64 {
        self.insert_with(key, value, 0, 0)
    }

    pub fn insert_with(&self, key: &str, value: &[u8], flags: u32, expiration: i64) -> u64 {
        let cas = self.state.next_cas.fetch_add(1, Ordering::SeqCst);
        self.state.items.lock().insert(
            key.to_string(),
            FakeItem {
                value: value.to_vec(),
                flags,
                expiration,
                cas,
            },
        );
        cas
    }

    pub fn item(&self, key: &str) -> Option<FakeItem> {
        self.state.items.lock().get(key).cloned()
    }

    pub fn value(&self, key: &str) -> Option<Vec<u8>> {
        self.item(key).map(|item| item.value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.state.items.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.state.items.lock().len()
    }

    pub fn remove(&self, key: &str) {
        self.state.items.lock().remove(key);
    }

    /// Close the connection on the next request instead of replying.
    pub fn drop_next_request(&self) {
        self.state.drop_next.store(true, Ordering::SeqCst);
    }

    /// Truncate metadump output after `lines` records.
    pub fn limit_metadump(&self, lines: usize) {
        *self.state.metadump_limit.lock() = Some(lines);
    }
}

// ============================================================================
// Connection handling
// ============================================================================

async fn handle_connection(stream: TcpStream, state: Arc<FakeState>) -> std::io::Result<()> {
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(());
        }
        if state.drop_next.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let reply = match parts.as_slice() {
            ["version"] => version_reply(&state),
            ["stats"] => stats_reply(&state),
            ["get", keys @ ..] => get_reply(&state, keys, false),
            ["gets", keys @ ..] => get_reply(&state, keys, true),
            ["set", key, flags, exptime, len] => {
                let data = read_data_block(&mut reader, len).await?;
                store(&state, key, flags, exptime, data, None)
            }
            ["cas", key, flags, exptime, len, cas] => {
                let data = read_data_block(&mut reader, len).await?;
                store(&state, key, flags, exptime, data, cas.parse().ok())
            }
            ["delete", key] => delete_reply(&state, key),
            ["lru_crawler", "metadump", "all"] => {
                let limit = metadump_limit(&state);
                let lines = metadump_lines(&state);
                match limit {
                    Some(limit) if limit < lines.len() => {
                        for l in lines.iter().take(limit) {
                            write.write_all(l.as_bytes()).await?;
                        }
                        write.flush().await?;
                        return Ok(());
                    }
                    _ => {
                        let mut out = lines.concat().into_bytes();
                        out.extend_from_slice(b"END\r\n");
                        out
                    }
                }
            }
            _ => b"ERROR\r\n".to_vec(),
        };

        write.write_all(&reply).await?;
        write.flush().await?;
    }
}

async fn read_data_block<R>(reader: &mut R, len: &str) -> std::io::Result<Option<Vec<u8>>>
where
    R: AsyncReadExt + Unpin,
{
    let Ok(len) = len.parse::<usize>() else {
        return Ok(None);
    };
    let mut data = vec![0u8; len + 2];
    reader.read_exact(&mut data).await?;
    data.truncate(len);
    Ok(Some(data))
}

fn version_reply(state: &FakeState) -> Vec<u8> {
    format!("VERSION {}\r\n", state.version.lock()).into_bytes()
}

fn delete_reply(state: &FakeState, key: &str) -> Vec<u8> {
    match state.items.lock().remove(key) {
        Some(_) => b"DELETED\r\n".to_vec(),
        None => b"NOT_FOUND\r\n".to_vec(),
    }
}

fn stats_reply(state: &FakeState) -> Vec<u8> {
    let items = state.items.lock().len();
    format!(
        "STAT pid 4242\r\nSTAT version {}\r\nSTAT curr_items {}\r\nEND\r\n",
        state.version.lock(),
        items
    )
    .into_bytes()
}

fn get_reply(state: &FakeState, keys: &[&str], with_cas: bool) -> Vec<u8> {
    let items = state.items.lock();
    let mut out = Vec::new();
    for key in keys {
        if let Some(item) = items.get(*key) {
            let header = if with_cas {
                format!(
                    "VALUE {} {} {} {}\r\n",
                    key,
                    item.flags,
                    item.value.len(),
                    item.cas
                )
            } else {
                format!("VALUE {} {} {}\r\n", key, item.flags, item.value.len())
            };
            out.extend_from_slice(header.as_bytes());
            out.extend_from_slice(&item.value);
            out.extend_from_slice(b"\r\n");
        }
    }
    out.extend_from_slice(b"END\r\n");
    out
}

fn store(
    state: &FakeState,
    key: &str,
    flags: &str,
    exptime: &str,
    data: Option<Vec<u8>>,
    expected_cas: Option<u64>,
) -> Vec<u8> {
    let (Some(value), Ok(flags), Ok(exptime)) = (data, flags.parse::<u32>(), exptime.parse::<i64>())
    else {
        return b"CLIENT_ERROR bad command line format\r\n".to_vec();
    };

    let mut items = state.items.lock();
    if let Some(expected) = expected_cas {
        match items.get(key) {
            None => return b"NOT_FOUND\r\n".to_vec(),
            Some(item) if item.cas != expected => return b"EXISTS\r\n".to_vec(),
            Some(_) => {}
        }
    }

    let expiration = if exptime > 0 {
        chrono::Utc::now().timestamp() + exptime
    } else {
        0
    };
    let cas = state.next_cas.fetch_add(1, Ordering::SeqCst);
    items.insert(
        key.to_string(),
        FakeItem {
            value,
            flags,
            expiration,
            cas,
        },
    );
    b"STORED\r\n".to_vec()
}

fn metadump_limit(state: &FakeState) -> Option<usize> {
    *state.metadump_limit.lock()
}

fn metadump_lines(state: &FakeState) -> Vec<String> {
    state
        .items
        .lock()
        .iter()
        .map(|(key, item)| {
            let exp = if item.expiration == 0 {
                -1
            } else {
                item.expiration
            };
            format!(
                "key={} exp={} la=0 cas={} fetch=no cls=1 size={}\r\n",
                urlencoding::encode(key),
                exp,
                item.cas,
                item.value.len()
            )
        })
        .collect()
}

// ============================================================================
// Misc helpers
// ============================================================================

/// Address nothing is listening on.
#[allow(dead_code)]
pub fn unused_addr() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("should bind to random port");
    let addr = listener
        .local_addr()
        .expect("should have local addr")
        .to_string();
    drop(listener);
    addr
}
