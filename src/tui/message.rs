//! Messages folded into [`App::update`](super::app::App::update) and the
//! commands it hands back for the scheduler to run.

use std::sync::Arc;

use bytes::Bytes;
use crossterm::event::KeyEvent;

use memtui_core::batch::BatchDeleteResult;
use memtui_core::format::ViewMode;
use memtui_core::{
    CasItem, ClientOptions, EnumerationOutcome, KeyRecord, MemtuiError, ProtocolClient,
    ServerCapabilities,
};

use super::editor::EditorSave;

/// Opaque data a dialog carries back to the app with its result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DialogContext {
    #[default]
    None,
    DeleteKey(String),
    BatchDelete(Vec<String>),
    NewKeyName,
    NewKeyValue(String),
}

/// Actions reachable from the command palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Refresh,
    NewKey,
    Delete,
    Edit,
    Filter,
    CopyKey,
    CopyValue,
    View(ViewMode),
    ExpandAll,
    CollapseAll,
    ClearSelection,
    Help,
    Quit,
}

#[derive(Debug)]
pub enum Message {
    // ── Terminal ───────────────────────────────────────────────────────────
    Key(KeyEvent),
    Resize(u16, u16),
    Tick,

    // ── Connection lifecycle ───────────────────────────────────────────────
    Connected {
        client: Arc<ProtocolClient>,
        capabilities: ServerCapabilities,
    },
    ConnectionFailed(MemtuiError),

    // ── Data results ───────────────────────────────────────────────────────
    KeysLoaded {
        outcome: EnumerationOutcome,
        /// Non-fatal notice, e.g. the server cannot enumerate keys
        warning: Option<String>,
    },
    ValueLoaded {
        record: KeyRecord,
        item: CasItem,
    },
    ValueLoadFailed {
        key: String,
        error: MemtuiError,
    },
    ValueSaved {
        key: String,
        result: Result<(), MemtuiError>,
    },
    KeyCreated {
        key: String,
        result: Result<(), MemtuiError>,
    },
    KeyDeleted {
        key: String,
        result: Result<(), MemtuiError>,
    },
    BatchDeleted(BatchDeleteResult),
    ClipboardOk(String),
    ClipboardErr(String),

    // ── Overlay results ────────────────────────────────────────────────────
    ConfirmResult {
        result: bool,
        context: DialogContext,
    },
    InputResult {
        value: String,
        cancelled: bool,
        context: DialogContext,
    },
    EditorSave(EditorSave),
    EditorCancel,
    CommandExecute(AppAction),
    CommandCancel,

    /// A command task panicked
    CommandFailed {
        command: &'static str,
        error: String,
    },
}

/// Whether a set creates a key or saves an edit; picks the result message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetIntent {
    Create,
    Edit,
}

/// Command kinds where a new request supersedes the one in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Connect,
    EnumerateKeys,
    LoadValue,
}

/// Deferred IO. Each variant other than `None`, `Batch` and `Quit` produces
/// exactly one [`Message`].
#[derive(Debug, Default)]
pub enum Command {
    #[default]
    None,
    Batch(Vec<Command>),
    Quit,
    Connect {
        options: ClientOptions,
    },
    EnumerateKeys {
        client: Arc<ProtocolClient>,
        capabilities: ServerCapabilities,
    },
    LoadValue {
        client: Arc<ProtocolClient>,
        record: KeyRecord,
    },
    SetValue {
        client: Arc<ProtocolClient>,
        key: String,
        value: Bytes,
        flags: u32,
        ttl: i32,
        intent: SetIntent,
    },
    CompareAndSwap {
        client: Arc<ProtocolClient>,
        item: CasItem,
    },
    Delete {
        client: Arc<ProtocolClient>,
        key: String,
    },
    BatchDelete {
        client: Option<Arc<ProtocolClient>>,
        keys: Vec<String>,
    },
    CopyToClipboard {
        text: String,
        /// What was copied, for the status line
        label: String,
    },
}

impl Command {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::None => "none",
            Command::Batch(_) => "batch",
            Command::Quit => "quit",
            Command::Connect { .. } => "connect",
            Command::EnumerateKeys { .. } => "enumerate_keys",
            Command::LoadValue { .. } => "load_value",
            Command::SetValue { .. } => "set_value",
            Command::CompareAndSwap { .. } => "compare_and_swap",
            Command::Delete { .. } => "delete",
            Command::BatchDelete { .. } => "batch_delete",
            Command::CopyToClipboard { .. } => "copy_to_clipboard",
        }
    }

    /// Replaceable kind, if any. Mutations are never replaced.
    pub fn kind(&self) -> Option<CommandKind> {
        match self {
            Command::Connect { .. } => Some(CommandKind::Connect),
            Command::EnumerateKeys { .. } => Some(CommandKind::EnumerateKeys),
            Command::LoadValue { .. } => Some(CommandKind::LoadValue),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Command::None)
    }

    /// Combine two commands, dropping `None`s.
    pub fn and(self, other: Command) -> Command {
        match (self, other) {
            (Command::None, c) | (c, Command::None) => c,
            (Command::Batch(mut a), Command::Batch(b)) => {
                a.extend(b);
                Command::Batch(a)
            }
            (Command::Batch(mut a), c) => {
                a.push(c);
                Command::Batch(a)
            }
            (a, b) => Command::Batch(vec![a, b]),
        }
    }

    /// Expand nested batches into runnable commands, dropping `None`.
    pub fn flatten(self) -> Vec<Command> {
        match self {
            Command::None => Vec::new(),
            Command::Batch(commands) => commands.into_iter().flat_map(Command::flatten).collect(),
            other => vec![other],
        }
    }
}
