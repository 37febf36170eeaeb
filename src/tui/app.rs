//! Application state and the update function.
//!
//! [`App`] owns every piece of UI state. The runtime feeds it [`Message`]s
//! (terminal input and command results) through [`App::update`], which
//! mutates state and returns the [`Command`] to run next. Nothing in here
//! performs IO.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, info, warn};

use memtui_core::batch::BatchDeleteResult;
use memtui_core::format::ViewMode;
use memtui_core::model::now_unix;
use memtui_core::validation::{batch_delete_validator, key_name_validator};
use memtui_core::{
    CasItem, ClientOptions, Config, EnumerationOutcome, KeyRecord, MemtuiError, ProtocolClient,
    ServerCapabilities, CAS_CONFLICT_MESSAGE,
};

use super::editor::{Editor, EditorSave};
use super::keytree::{KeyTree, TreeEvent};
use super::message::{AppAction, Command, DialogContext, Message, SetIntent};
use super::overlay::{
    CommandPalette, ConfirmDialog, HelpPanel, InputDialog, Overlay, OverlayOutcome, TextInput,
};
use super::viewer::Viewer;

/// How long an informational status stays on screen.
const STATUS_TTL: Duration = Duration::from_secs(5);

/// Rows taken by the status line and pane borders.
const CHROME_ROWS: u16 = 3;

/// Connection lifecycle.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppState {
    Connecting,
    Connected,
    Loading,
    Ready,
    Error,
}

impl AppState {
    pub fn name(&self) -> &'static str {
        match self {
            AppState::Connecting => "Connecting",
            AppState::Connected => "Connected",
            AppState::Loading => "Loading",
            AppState::Ready => "Ready",
            AppState::Error => "Error",
        }
    }
}

/// Where key input goes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Focus {
    KeyList,
    Viewer,
    Dialog,
    Editor,
    CommandPalette,
    Help,
    Filter,
}

/// The two panes behind any overlay.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Pane {
    KeyList,
    Viewer,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

#[derive(Clone, Debug)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
    pub at: Instant,
}

/// All application state.
pub struct App {
    config: Config,
    options: ClientOptions,
    state: AppState,
    client: Option<Arc<ProtocolClient>>,
    capabilities: Option<ServerCapabilities>,
    tree: KeyTree,
    viewer: Option<Viewer>,
    current_item: Option<CasItem>,
    pane: Pane,
    overlay: Option<Overlay>,
    /// Filter line, present while filter mode is active
    filter: Option<TextInput>,
    status: Option<StatusMessage>,
    /// Capability warning, kept until the next reload
    banner: Option<String>,
    last_error: Option<String>,
    width: u16,
    height: u16,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config) -> Self {
        let options = ClientOptions::from_config(&config.server);
        let tree = KeyTree::new(config.ui.key_delimiter.clone());
        let mut app = Self {
            config,
            options,
            state: AppState::Connecting,
            client: None,
            capabilities: None,
            tree,
            viewer: None,
            current_item: None,
            pane: Pane::KeyList,
            overlay: None,
            filter: None,
            status: None,
            banner: None,
            last_error: None,
            width: 80,
            height: 24,
            should_quit: false,
        };
        app.resize(80, 24);
        app
    }

    /// First command: connect and probe the server.
    pub fn init(&mut self) -> Command {
        self.state = AppState::Connecting;
        info!(addr = %self.options.addr, "connecting");
        Command::Connect {
            options: self.options.clone(),
        }
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn addr(&self) -> &str {
        &self.options.addr
    }

    pub fn client(&self) -> Option<&Arc<ProtocolClient>> {
        self.client.as_ref()
    }

    pub fn capabilities(&self) -> Option<&ServerCapabilities> {
        self.capabilities.as_ref()
    }

    pub fn tree(&self) -> &KeyTree {
        &self.tree
    }

    pub fn viewer(&self) -> Option<&Viewer> {
        self.viewer.as_ref()
    }

    pub fn current_item(&self) -> Option<&CasItem> {
        self.current_item.as_ref()
    }

    pub fn pane(&self) -> Pane {
        self.pane
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn filter_input(&self) -> Option<&TextInput> {
        self.filter.as_ref()
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Component that currently receives key input.
    pub fn focus(&self) -> Focus {
        match &self.overlay {
            Some(Overlay::Confirm(_)) | Some(Overlay::Input(_)) => Focus::Dialog,
            Some(Overlay::Palette(_)) => Focus::CommandPalette,
            Some(Overlay::Help(_)) => Focus::Help,
            Some(Overlay::Editor(_)) => Focus::Editor,
            None if self.filter.is_some() => Focus::Filter,
            None => match self.pane {
                Pane::KeyList => Focus::KeyList,
                Pane::Viewer => Focus::Viewer,
            },
        }
    }

    /// Rows available inside the editor overlay.
    pub fn editor_height(&self) -> usize {
        self.height.saturating_sub(CHROME_ROWS + 1) as usize
    }

    // ── Update ─────────────────────────────────────────────────────────────

    pub fn update(&mut self, message: Message) -> Command {
        match message {
            Message::Key(key) => self.handle_key(key),
            Message::Resize(width, height) => {
                self.resize(width, height);
                Command::None
            }
            Message::Tick => {
                self.expire_status();
                Command::None
            }

            Message::Connected {
                client,
                capabilities,
            } => self.on_connected(client, capabilities),
            Message::ConnectionFailed(error) => {
                self.fail(error.to_string());
                Command::None
            }

            Message::KeysLoaded { outcome, warning } => self.on_keys_loaded(outcome, warning),
            Message::ValueLoaded { record, item } => {
                let mut viewer =
                    Viewer::new(record, &item, self.config.format.max_decompressed_bytes);
                let (width, height) = self.viewer_size();
                viewer.set_size(width, height);
                debug!(key = %item.key, bytes = item.value.len(), "value loaded");
                self.viewer = Some(viewer);
                self.current_item = Some(item);
                Command::None
            }
            Message::ValueLoadFailed { key, error } => {
                if error.is_not_found() {
                    if self.viewer.as_ref().is_some_and(|v| v.key() == key) {
                        self.close_viewer();
                    }
                    self.set_status(StatusLevel::Warning, error.to_string());
                } else {
                    self.set_status(StatusLevel::Error, error.to_string());
                }
                Command::None
            }

            Message::ValueSaved { key, result } => self.on_value_saved(key, result),
            Message::KeyCreated { key, result } => match result {
                Ok(()) => {
                    info!(key = %key, "key created");
                    self.set_status(StatusLevel::Info, format!("Created {}", key));
                    let load = self.load_value(KeyRecord::bare(key));
                    self.refresh_keys().and(load)
                }
                Err(e) => {
                    self.set_status(StatusLevel::Error, e.to_string());
                    Command::None
                }
            },
            Message::KeyDeleted { key, result } => match result {
                Ok(()) => {
                    info!(key = %key, "key deleted");
                    if self.viewer.as_ref().is_some_and(|v| v.key() == key) {
                        self.close_viewer();
                    }
                    self.tree.deselect([&key]);
                    self.set_status(StatusLevel::Info, format!("Deleted {}", key));
                    self.refresh()
                }
                Err(e) => {
                    self.set_status(StatusLevel::Error, e.to_string());
                    Command::None
                }
            },
            Message::BatchDeleted(result) => self.on_batch_deleted(result),

            Message::ClipboardOk(label) => {
                self.set_status(StatusLevel::Info, format!("Copied {} to clipboard", label));
                Command::None
            }
            Message::ClipboardErr(error) => {
                self.set_status(StatusLevel::Warning, format!("Clipboard error: {}", error));
                Command::None
            }

            Message::ConfirmResult { result, context } => self.on_confirm(result, context),
            Message::InputResult {
                value,
                cancelled,
                context,
            } => self.on_input(value, cancelled, context),
            Message::EditorSave(save) => self.on_editor_save(save),
            Message::EditorCancel | Message::CommandCancel => Command::None,
            Message::CommandExecute(action) => self.perform(action),

            Message::CommandFailed { command, error } => {
                warn!(command, error = %error, "command failed");
                match command {
                    "connect" => self.fail(format!("connect failed: {}", error)),
                    _ => {
                        if self.state == AppState::Loading {
                            self.state = AppState::Ready;
                        }
                        self.set_status(
                            StatusLevel::Error,
                            format!("{} failed: {}", command, error),
                        );
                    }
                }
                Command::None
            }
        }
    }

    fn on_connected(
        &mut self,
        client: Arc<ProtocolClient>,
        capabilities: ServerCapabilities,
    ) -> Command {
        info!(addr = client.addr(), version = %capabilities.version, "connected");
        self.state = AppState::Connected;
        self.last_error = None;
        self.set_status(
            StatusLevel::Info,
            format!("Connected to {} (memcached {})", client.addr(), capabilities.version),
        );
        self.client = Some(client);
        self.capabilities = Some(capabilities);
        self.refresh_keys()
    }

    fn on_keys_loaded(&mut self, outcome: EnumerationOutcome, warning: Option<String>) -> Command {
        if self.state == AppState::Error {
            debug!(keys = outcome.records.len(), "key list dropped until reconnect");
            return Command::None;
        }
        let EnumerationOutcome { records, error } = outcome;
        if let Some(error) = &error {
            if records.is_empty() && error.is_fatal() {
                self.fail(error.to_string());
                return Command::None;
            }
        }

        let count = records.len();
        self.tree.set_records(records);
        self.state = AppState::Ready;
        info!(keys = count, partial = error.is_some(), "keys loaded");

        if let Some(warning) = &warning {
            warn!(warning = %warning, "enumeration unavailable");
        }
        self.banner = warning;

        if let Some(error) = error {
            warn!(keys = count, error = %error, "partial key list");
            self.set_status(
                StatusLevel::Warning,
                format!("Showing {} keys; listing stopped early: {}", count, error),
            );
        }
        Command::None
    }

    fn on_value_saved(&mut self, key: String, result: Result<(), MemtuiError>) -> Command {
        match result {
            Ok(()) => {
                info!(key = %key, "value saved");
                self.set_status(StatusLevel::Info, format!("Saved {}", key));
                self.refresh()
            }
            Err(e) if e.is_cas_conflict() => {
                warn!(key = %key, "cas conflict");
                self.set_status(StatusLevel::Error, CAS_CONFLICT_MESSAGE);
                self.refresh()
            }
            Err(e) => {
                self.set_status(StatusLevel::Error, e.to_string());
                Command::None
            }
        }
    }

    fn on_batch_deleted(&mut self, result: BatchDeleteResult) -> Command {
        let summary = result.summary();
        for (key, error) in &result.errors {
            warn!(key = %key, error = %error, "batch delete failed for key");
        }
        info!(
            deleted = summary.deleted_count,
            failed = summary.failed_count,
            "batch delete finished"
        );

        if self
            .viewer
            .as_ref()
            .is_some_and(|v| result.deleted.iter().any(|k| k == v.key()))
        {
            self.close_viewer();
        }
        self.tree.deselect(result.deleted.iter());

        let level = if summary.all_succeeded() {
            StatusLevel::Info
        } else if summary.deleted_count > 0 {
            StatusLevel::Warning
        } else {
            StatusLevel::Error
        };
        self.set_status(level, summary.to_string());

        if summary.should_refresh() {
            self.refresh()
        } else {
            Command::None
        }
    }

    fn on_confirm(&mut self, result: bool, context: DialogContext) -> Command {
        match context {
            DialogContext::DeleteKey(key) if result => match self.require_client() {
                Some(client) => Command::Delete { client, key },
                None => Command::None,
            },
            _ => Command::None,
        }
    }

    fn on_input(&mut self, value: String, cancelled: bool, context: DialogContext) -> Command {
        if cancelled {
            return Command::None;
        }
        match context {
            DialogContext::NewKeyName => {
                let dialog = InputDialog::new(
                    format!("Value for {}", value),
                    DialogContext::NewKeyValue(value),
                )
                .with_placeholder("value");
                self.open_overlay(Overlay::Input(dialog));
                Command::None
            }
            DialogContext::NewKeyValue(key) => match self.require_client() {
                Some(client) => Command::SetValue {
                    client,
                    key,
                    value: value.into_bytes().into(),
                    flags: 0,
                    ttl: 0,
                    intent: SetIntent::Create,
                },
                None => Command::None,
            },
            DialogContext::BatchDelete(keys) => {
                info!(count = keys.len(), "batch delete confirmed");
                Command::BatchDelete {
                    client: self.client.clone(),
                    keys,
                }
            }
            DialogContext::DeleteKey(_) | DialogContext::None => Command::None,
        }
    }

    fn on_editor_save(&mut self, save: EditorSave) -> Command {
        let Some(client) = self.require_client() else {
            return Command::None;
        };
        let flags = self
            .current_item
            .as_ref()
            .filter(|item| item.key == save.key)
            .map_or(0, |item| item.flags);
        let ttl = self
            .viewer
            .as_ref()
            .filter(|v| v.key() == save.key)
            .map_or(0, |v| v.record().remaining_ttl(now_unix()));

        match save.cas {
            Some(cas) => {
                debug!(key = %save.key, cas, "saving with cas");
                Command::CompareAndSwap {
                    client,
                    item: CasItem {
                        key: save.key,
                        value: save.value,
                        flags,
                        expiration: ttl,
                        cas,
                    },
                }
            }
            None => {
                debug!(key = %save.key, "saving with set");
                Command::SetValue {
                    client,
                    key: save.key,
                    value: save.value,
                    flags,
                    ttl,
                    intent: SetIntent::Edit,
                }
            }
        }
    }

    // ── Input routing ──────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Command {
        if let Some(overlay) = self.overlay.as_mut() {
            let outcome = overlay.handle_key(key);
            let editor_height = self.editor_height();
            return match outcome {
                OverlayOutcome::Consumed => {
                    if let Some(Overlay::Editor(editor)) = self.overlay.as_mut() {
                        editor.scroll_to_cursor(editor_height);
                    }
                    Command::None
                }
                OverlayOutcome::Close => {
                    self.overlay = None;
                    Command::None
                }
                OverlayOutcome::Emit(message) => {
                    self.overlay = None;
                    self.update(message)
                }
            };
        }

        if self.state == AppState::Error {
            return match self.global_action(key) {
                Some(action) if available_in_error(action) => self.perform(action),
                _ => Command::None,
            };
        }

        if let Some(filter) = self.filter.as_mut() {
            match key.code {
                KeyCode::Esc => {
                    self.filter = None;
                    self.tree.set_filter("");
                }
                KeyCode::Enter => {
                    self.filter = None;
                }
                _ => {
                    if filter.handle_key(key) {
                        let pattern = filter.value().to_string();
                        self.tree.set_filter(&pattern);
                    }
                }
            }
            return Command::None;
        }

        if key.code == KeyCode::Char('p') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.open_palette();
            return Command::None;
        }
        if let Some(action) = self.global_action(key) {
            return self.perform(action);
        }

        match key.code {
            KeyCode::Tab => {
                self.pane = match self.pane {
                    Pane::KeyList => Pane::Viewer,
                    Pane::Viewer => Pane::KeyList,
                };
                return Command::None;
            }
            KeyCode::Esc => {
                if self.pane == Pane::Viewer {
                    self.pane = Pane::KeyList;
                } else if self.tree.has_selection() {
                    self.tree.clear_selection();
                }
                return Command::None;
            }
            _ => {}
        }

        match self.pane {
            Pane::KeyList => match self.tree.handle_key(key) {
                TreeEvent::KeySelected(record) => self.load_value(record),
                TreeEvent::Changed | TreeEvent::Ignored => Command::None,
            },
            Pane::Viewer => {
                if let Some(viewer) = self.viewer.as_mut() {
                    viewer.handle_key(key);
                }
                Command::None
            }
        }
    }

    fn global_action(&self, key: KeyEvent) -> Option<AppAction> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let action = match key.code {
            KeyCode::Char('c') if ctrl => AppAction::Quit,
            KeyCode::Char(_) if ctrl => return None,
            KeyCode::Char('q') => AppAction::Quit,
            KeyCode::Char('?') => AppAction::Help,
            KeyCode::Char('r') => AppAction::Refresh,
            KeyCode::Char('/') => AppAction::Filter,
            KeyCode::Char('d') => AppAction::Delete,
            KeyCode::Char('e') => AppAction::Edit,
            KeyCode::Char('n') => AppAction::NewKey,
            KeyCode::Char('c') => AppAction::CopyValue,
            KeyCode::Char('y') => AppAction::CopyKey,
            _ => return None,
        };
        Some(action)
    }

    // ── Actions ────────────────────────────────────────────────────────────

    /// Run a user action, from a key binding or the palette.
    pub fn perform(&mut self, action: AppAction) -> Command {
        debug!(?action, "action");
        if self.state == AppState::Error && !available_in_error(action) {
            debug!(?action, "action ignored until reconnect");
            return Command::None;
        }
        match action {
            AppAction::Quit => {
                self.should_quit = true;
                Command::Quit
            }
            AppAction::Help => {
                self.open_overlay(Overlay::Help(HelpPanel::new()));
                Command::None
            }
            AppAction::Refresh => match self.state {
                AppState::Connected | AppState::Ready => self.refresh(),
                AppState::Error => self.reconnect(),
                AppState::Connecting | AppState::Loading => Command::None,
            },
            AppAction::Filter => {
                self.filter = Some(TextInput::new(self.tree.filter()));
                Command::None
            }
            AppAction::Delete => {
                self.open_delete();
                Command::None
            }
            AppAction::Edit => {
                self.open_editor();
                Command::None
            }
            AppAction::NewKey => {
                let dialog = InputDialog::new("New key name", DialogContext::NewKeyName)
                    .with_placeholder("key")
                    .with_validator(key_name_validator);
                self.open_overlay(Overlay::Input(dialog));
                Command::None
            }
            AppAction::CopyValue => match &self.current_item {
                Some(item) => Command::CopyToClipboard {
                    text: String::from_utf8_lossy(&item.value).into_owned(),
                    label: "value".to_string(),
                },
                None => {
                    self.set_status(StatusLevel::Warning, "No value loaded");
                    Command::None
                }
            },
            AppAction::CopyKey => match self.target_key() {
                Some(key) => Command::CopyToClipboard {
                    text: key,
                    label: "key".to_string(),
                },
                None => Command::None,
            },
            AppAction::View(mode) => {
                self.set_view_mode(mode);
                Command::None
            }
            AppAction::ExpandAll => {
                self.tree.expand_all();
                Command::None
            }
            AppAction::CollapseAll => {
                self.tree.collapse_all();
                Command::None
            }
            AppAction::ClearSelection => {
                self.tree.clear_selection();
                Command::None
            }
        }
    }

    fn set_view_mode(&mut self, mode: ViewMode) {
        if let Some(viewer) = self.viewer.as_mut() {
            viewer.set_mode(mode);
        }
    }

    /// Key the single-key actions apply to: the viewed key when the viewer
    /// has focus, otherwise the leaf under the cursor.
    fn target_key(&self) -> Option<String> {
        if self.pane == Pane::Viewer {
            if let Some(viewer) = &self.viewer {
                return Some(viewer.key().to_string());
            }
        }
        self.tree.current_record().map(|r| r.key.clone())
    }

    fn open_delete(&mut self) {
        if self.tree.has_selection() {
            let keys = self.tree.selected_keys();
            let dialog = InputDialog::new(
                format!("Delete {} keys? Type DELETE to confirm", keys.len()),
                DialogContext::BatchDelete(keys),
            )
            .with_placeholder("DELETE")
            .with_validator(batch_delete_validator);
            self.open_overlay(Overlay::Input(dialog));
            return;
        }
        if let Some(key) = self.target_key() {
            let dialog = ConfirmDialog::destructive(
                "Delete key",
                format!("Delete '{}'?", key),
                DialogContext::DeleteKey(key),
            );
            self.open_overlay(Overlay::Confirm(dialog));
        }
    }

    fn open_editor(&mut self) {
        let Some(item) = &self.current_item else {
            self.set_status(StatusLevel::Warning, "No value loaded; press Enter on a key first");
            return;
        };
        match Editor::open(item) {
            Ok(editor) => {
                self.open_overlay(Overlay::Editor(editor));
            }
            Err(e) => self.set_status(StatusLevel::Error, e.to_string()),
        }
    }

    fn open_overlay(&mut self, overlay: Overlay) -> bool {
        if let Some(open) = &self.overlay {
            debug!(open = open.name(), requested = overlay.name(), "overlay already open");
            return false;
        }
        debug!(overlay = overlay.name(), "overlay opened");
        self.overlay = Some(overlay);
        true
    }

    /// Open the command palette.
    pub fn open_palette(&mut self) -> bool {
        let palette = CommandPalette::new(self.config.ui.palette_max_results);
        self.open_overlay(Overlay::Palette(palette))
    }

    // ── Commands ───────────────────────────────────────────────────────────

    fn require_client(&mut self) -> Option<Arc<ProtocolClient>> {
        if self.client.is_none() {
            self.set_status(StatusLevel::Error, MemtuiError::NotConnected.to_string());
        }
        self.client.clone()
    }

    fn reconnect(&mut self) -> Command {
        self.client = None;
        self.capabilities = None;
        self.init()
    }

    fn refresh_keys(&mut self) -> Command {
        if !matches!(
            self.state,
            AppState::Connected | AppState::Ready | AppState::Loading
        ) {
            return Command::None;
        }
        let (Some(client), Some(capabilities)) = (self.client.clone(), self.capabilities.clone())
        else {
            return Command::None;
        };
        self.state = AppState::Loading;
        self.banner = None;
        Command::EnumerateKeys {
            client,
            capabilities,
        }
    }

    /// Reload the key list and the value on display.
    fn refresh(&mut self) -> Command {
        let keys = self.refresh_keys();
        let value = match self.viewer.as_ref().map(|v| v.record().clone()) {
            Some(record) => self.load_value(record),
            None => Command::None,
        };
        keys.and(value)
    }

    fn load_value(&mut self, record: KeyRecord) -> Command {
        if self.state == AppState::Error {
            return Command::None;
        }
        match self.client.clone() {
            Some(client) => Command::LoadValue { client, record },
            None => Command::None,
        }
    }

    // ── State helpers ──────────────────────────────────────────────────────

    fn fail(&mut self, error: String) {
        warn!(error = %error, "connection failed");
        self.state = AppState::Error;
        self.overlay = None;
        self.filter = None;
        self.set_status(StatusLevel::Error, error.clone());
        self.last_error = Some(error);
    }

    fn close_viewer(&mut self) {
        self.viewer = None;
        self.current_item = None;
        self.pane = Pane::KeyList;
    }

    fn set_status(&mut self, level: StatusLevel, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            level,
            text: text.into(),
            at: Instant::now(),
        });
    }

    fn expire_status(&mut self) {
        if let Some(status) = &self.status {
            if status.level == StatusLevel::Info && status.at.elapsed() >= STATUS_TTL {
                self.status = None;
            }
        }
    }

    fn viewer_size(&self) -> (usize, usize) {
        let width = (self.width as usize * 65 / 100).saturating_sub(2);
        let height = self.height.saturating_sub(CHROME_ROWS) as usize;
        (width, height)
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.tree
            .set_height(height.saturating_sub(CHROME_ROWS) as usize);
        let (vw, vh) = self.viewer_size();
        if let Some(viewer) = self.viewer.as_mut() {
            viewer.set_size(vw, vh);
        }
        let editor_height = self.editor_height();
        if let Some(Overlay::Editor(editor)) = self.overlay.as_mut() {
            editor.scroll_to_cursor(editor_height);
        }
    }
}

/// Only quitting, help and retry work while the connection is down.
fn available_in_error(action: AppAction) -> bool {
    matches!(action, AppAction::Quit | AppAction::Help | AppAction::Refresh)
}
