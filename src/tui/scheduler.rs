//! Command execution.
//!
//! [`execute`] turns one [`Command`] into its result [`Message`]. The
//! [`Scheduler`] runs commands as tokio tasks and forwards their results to
//! the update loop over a channel. For replaceable kinds a new command
//! cancels and aborts the one in flight, and any result still carrying the
//! old ticket is dropped in [`Scheduler::accept`].

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use memtui_core::batch::batch_delete;
use memtui_core::cancel::{cancel_pair, CancelHandle, CancelToken};
use memtui_core::capability;
use memtui_core::model::now_unix;
use memtui_core::{EnumerationOutcome, ProtocolClient};

use super::clipboard::Clipboard;
use super::message::{Command, CommandKind, Message, SetIntent};

/// Identifies one issued replaceable command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub kind: CommandKind,
    pub seq: u64,
}

/// A finished command on its way to the update loop.
#[derive(Debug)]
pub struct Completion {
    pub ticket: Option<Ticket>,
    pub message: Message,
}

struct InFlight {
    seq: u64,
    cancel: CancelHandle,
    abort: AbortHandle,
}

pub struct Scheduler {
    tx: mpsc::UnboundedSender<Completion>,
    clipboard: Arc<dyn Clipboard>,
    in_flight: HashMap<CommandKind, InFlight>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new(tx: mpsc::UnboundedSender<Completion>, clipboard: Arc<dyn Clipboard>) -> Self {
        Self {
            tx,
            clipboard,
            in_flight: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Spawn every runnable command in `command`. Must be called inside a
    /// tokio runtime.
    pub fn submit(&mut self, command: Command) {
        for command in command.flatten() {
            if matches!(command, Command::Quit) {
                continue;
            }
            self.spawn(command);
        }
    }

    fn spawn(&mut self, command: Command) {
        let name = command.name();
        let kind = command.kind();
        self.next_seq += 1;
        let seq = self.next_seq;

        if let Some(kind) = kind {
            if let Some(previous) = self.in_flight.remove(&kind) {
                debug!(command = name, seq = previous.seq, "cancelling superseded command");
                previous.cancel.cancel();
                previous.abort.abort();
            }
        }

        let (cancel, token) = cancel_pair();
        let clipboard = Arc::clone(&self.clipboard);
        let task = tokio::spawn(execute(command, token, clipboard));

        let ticket = kind.map(|kind| Ticket { kind, seq });
        if let Some(kind) = kind {
            self.in_flight.insert(
                kind,
                InFlight {
                    seq,
                    cancel,
                    abort: task.abort_handle(),
                },
            );
        }

        debug!(command = name, seq, "command issued");
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let message = match task.await {
                Ok(Some(message)) => message,
                Ok(None) => return,
                Err(e) if e.is_panic() => {
                    let error = panic_text(e.into_panic());
                    warn!(command = name, error = %error, "command panicked");
                    Message::CommandFailed {
                        command: name,
                        error,
                    }
                }
                Err(_) => {
                    debug!(command = name, seq, "command aborted");
                    return;
                }
            };
            // receiver gone means the app is shutting down
            let _ = tx.send(Completion { ticket, message });
        });
    }

    /// Pass a completion through unless a newer command of its kind has
    /// been issued since.
    pub fn accept(&mut self, completion: Completion) -> Option<Message> {
        let Some(ticket) = completion.ticket else {
            return Some(completion.message);
        };
        match self.in_flight.get(&ticket.kind) {
            Some(current) if current.seq == ticket.seq => {
                self.in_flight.remove(&ticket.kind);
                Some(completion.message)
            }
            _ => {
                debug!(kind = ?ticket.kind, seq = ticket.seq, "dropping stale result");
                None
            }
        }
    }

    /// Number of replaceable commands still running.
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Cancel everything in flight.
    pub fn shutdown(&mut self) {
        for (_, flight) in self.in_flight.drain() {
            flight.cancel.cancel();
            flight.abort.abort();
        }
    }
}

fn panic_text(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run one command to completion. `None` for commands without a result.
pub async fn execute(
    command: Command,
    cancel: CancelToken,
    clipboard: Arc<dyn Clipboard>,
) -> Option<Message> {
    let message = match command {
        Command::None | Command::Batch(_) | Command::Quit => return None,

        Command::Connect { options } => {
            let client = ProtocolClient::new(options);
            match capability::detect(&client, &cancel).await {
                Ok(capabilities) => Message::Connected {
                    client: Arc::new(client),
                    capabilities,
                },
                Err(error) => Message::ConnectionFailed(error),
            }
        }

        Command::EnumerateKeys {
            client,
            capabilities,
        } => {
            if capabilities.supports_metadump {
                Message::KeysLoaded {
                    outcome: client.metadump(&cancel).await,
                    warning: None,
                }
            } else {
                Message::KeysLoaded {
                    outcome: EnumerationOutcome::complete(Vec::new()),
                    warning: Some(format!(
                        "memcached {} cannot list keys (needs 1.4.31+); open keys by name with 'n' or the palette",
                        capabilities.version
                    )),
                }
            }
        }

        Command::LoadValue { client, record } => match client.gets(&record.key, &cancel).await {
            Ok(mut item) => {
                item.expiration = record.remaining_ttl(now_unix());
                Message::ValueLoaded { record, item }
            }
            Err(error) => Message::ValueLoadFailed {
                key: record.key,
                error,
            },
        },

        Command::SetValue {
            client,
            key,
            value,
            flags,
            ttl,
            intent,
        } => {
            let result = client.set(&key, value, flags, ttl, &cancel).await;
            match intent {
                SetIntent::Create => Message::KeyCreated { key, result },
                SetIntent::Edit => Message::ValueSaved { key, result },
            }
        }

        Command::CompareAndSwap { client, item } => {
            let result = client.compare_and_swap(&item, &cancel).await;
            Message::ValueSaved {
                key: item.key,
                result,
            }
        }

        Command::Delete { client, key } => {
            let result = client.delete(&key, &cancel).await;
            Message::KeyDeleted { key, result }
        }

        Command::BatchDelete { client, keys } => {
            Message::BatchDeleted(batch_delete(client.as_deref(), &keys, &cancel).await)
        }

        Command::CopyToClipboard { text, label } => {
            let result = tokio::task::spawn_blocking(move || clipboard.set_text(&text)).await;
            match result {
                Ok(Ok(())) => Message::ClipboardOk(label),
                Ok(Err(e)) => Message::ClipboardErr(e.to_string()),
                Err(e) => Message::ClipboardErr(e.to_string()),
            }
        }
    };
    Some(message)
}
