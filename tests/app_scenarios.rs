//! End-to-end scenarios: the app's update loop driven against an in-process
//! memcached, with commands run the way the scheduler runs them.
#![allow(clippy::unwrap_used)]

mod common;

use std::collections::VecDeque;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use common::*;
use memtui::tui::app::{App, AppState, Pane, StatusLevel};
use memtui::tui::clipboard::{Clipboard, MemoryClipboard};
use memtui::tui::message::{Command, Message};
use memtui::tui::overlay::Overlay;
use memtui::tui::scheduler;
use memtui_core::format::DataType;
use memtui_core::{CancelToken, CAS_CONFLICT_MESSAGE};

// ============================================================================
// Harness
// ============================================================================

fn key(code: KeyCode) -> Message {
    Message::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn ctrl(c: char) -> Message {
    Message::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        let command = app.update(key(KeyCode::Char(c)));
        assert!(command.is_none(), "typing {:?} produced {}", c, command.name());
    }
}

/// Run a single command and return its result message.
async fn run_one(command: Command) -> Message {
    let clipboard: Arc<dyn Clipboard> = Arc::new(MemoryClipboard::new());
    scheduler::execute(command, CancelToken::never(), clipboard)
        .await
        .expect("command should produce a message")
}

/// Run `command` and every command its results lead to, until idle.
async fn drive_with(app: &mut App, command: Command, clipboard: Arc<dyn Clipboard>) {
    let mut queue: VecDeque<Command> = command.flatten().into();
    while let Some(command) = queue.pop_front() {
        if let Some(message) =
            scheduler::execute(command, CancelToken::never(), clipboard.clone()).await
        {
            queue.extend(app.update(message).flatten());
        }
    }
}

async fn drive(app: &mut App, command: Command) {
    drive_with(app, command, Arc::new(MemoryClipboard::new())).await;
}

/// App connected to `server` with its key list loaded.
async fn ready_app(server: &FakeMemcached) -> App {
    let mut app = App::new(server.config());
    app.update(Message::Resize(120, 40));
    let init = app.init();
    drive(&mut app, init).await;
    assert_eq!(app.state(), AppState::Ready);
    app
}

/// Move the cursor to the leaf for `key` and press Enter.
async fn open_key(app: &mut App, key_name: &str) {
    app.update(key(KeyCode::Home));
    for _ in 0..app.tree().visible_len() {
        if app.tree().current_record().is_some_and(|r| r.key == key_name) {
            let command = app.update(key(KeyCode::Enter));
            drive(app, command).await;
            return;
        }
        app.update(key(KeyCode::Down));
    }
    panic!("{} not in the key list", key_name);
}

fn viewer_text(app: &App) -> String {
    app.viewer().unwrap().lines().join("\n")
}

// ============================================================================
// Connection
// ============================================================================

#[tokio::test]
async fn test_happy_path() {
    let server = FakeMemcached::start().await;
    server.insert("user:1", b"A");

    let mut app = App::new(server.config());
    app.update(Message::Resize(120, 40));

    let connect = app.init();
    assert_eq!(app.state(), AppState::Connecting);

    let connected = run_one(connect).await;
    let enumerate = app.update(connected);
    assert_eq!(app.state(), AppState::Loading);
    assert!(app.capabilities().unwrap().supports_metadump);

    let loaded = run_one(enumerate).await;
    assert!(app.update(loaded).is_none());
    assert_eq!(app.state(), AppState::Ready);

    assert_eq!(app.tree().leaf_count(), 1);
    assert_eq!(app.tree().filtered_keys(), vec!["user:1"]);

    app.update(key(KeyCode::Down));
    let load = app.update(key(KeyCode::Enter));
    drive(&mut app, load).await;

    let viewer = app.viewer().unwrap();
    assert_eq!(viewer.key(), "user:1");
    assert_eq!(viewer.detected(), DataType::Text);
    assert_eq!(viewer_text(&app), "A");
}

#[tokio::test]
async fn test_unreachable_server_enters_error_state() {
    let mut config = memtui::Config::default();
    config.server.addr = unused_addr();
    config.server.connect_timeout_secs = 1;
    let mut app = App::new(config);

    let init = app.init();
    drive(&mut app, init).await;

    assert_eq!(app.state(), AppState::Error);
    assert!(app.last_error().is_some());
    assert!(app.client().is_none());

    // retry dials again
    let retry = app.update(key(KeyCode::Char('r')));
    assert!(matches!(retry, Command::Connect { .. }));
    assert_eq!(app.state(), AppState::Connecting);
}

#[tokio::test]
async fn test_old_server_shows_banner_and_empty_list() {
    let server = FakeMemcached::start_with_version("1.4.15").await;
    server.insert("user:1", b"A");

    let app = ready_app(&server).await;
    assert_eq!(app.tree().leaf_count(), 0);
    assert!(app.banner().unwrap().contains("1.4.15"));
}

#[tokio::test]
async fn test_partial_key_list_is_shown_with_warning() {
    let server = FakeMemcached::start().await;
    for i in 0..3 {
        server.insert(&format!("k{}", i), b"v");
    }
    server.limit_metadump(1);

    let app = ready_app(&server).await;
    assert_eq!(app.tree().leaf_count(), 1);
    let status = app.status().unwrap();
    assert_eq!(status.level, StatusLevel::Warning);
    assert!(status.text.starts_with("Showing 1 keys"));
}

// ============================================================================
// Editing
// ============================================================================

#[tokio::test]
async fn test_edit_with_cas_success() {
    let server = FakeMemcached::start().await;
    let token = server.insert("user:1", b"A");

    let mut app = ready_app(&server).await;
    open_key(&mut app, "user:1").await;
    assert_eq!(app.current_item().unwrap().cas, token);

    app.update(key(KeyCode::Char('e')));
    let Some(Overlay::Editor(editor)) = app.overlay() else {
        panic!("editor not open");
    };
    assert_eq!(editor.buffer().text(), "A");
    assert_eq!(editor.cas(), Some(token));

    app.update(key(KeyCode::Delete));
    app.update(key(KeyCode::Char('B')));
    let Some(Overlay::Editor(editor)) = app.overlay() else {
        panic!("editor closed early");
    };
    assert!(editor.is_dirty());

    let save = app.update(ctrl('s'));
    assert!(matches!(&save, Command::CompareAndSwap { item, .. } if item.cas == token));
    assert!(app.overlay().is_none());
    drive(&mut app, save).await;

    assert_eq!(server.value("user:1").unwrap(), b"B".to_vec());
    assert_eq!(app.status().unwrap().text, "Saved user:1");

    // the refresh reloaded the value with its new token
    let item = app.current_item().unwrap();
    assert_eq!(item.value.as_ref(), b"B");
    assert_ne!(item.cas, token);
    assert_eq!(item.cas, server.item("user:1").unwrap().cas);
    assert_eq!(viewer_text(&app), "B");
}

#[tokio::test]
async fn test_edit_with_cas_conflict() {
    let server = FakeMemcached::start().await;
    server.insert("user:1", b"A");

    let mut app = ready_app(&server).await;
    open_key(&mut app, "user:1").await;
    app.update(key(KeyCode::Char('e')));

    // another client writes while the editor is open
    server.insert("user:1", b"theirs");

    app.update(key(KeyCode::Delete));
    app.update(key(KeyCode::Char('B')));
    let save = app.update(ctrl('s'));
    drive(&mut app, save).await;

    let status = app.status().unwrap();
    assert_eq!(status.level, StatusLevel::Error);
    assert_eq!(status.text, CAS_CONFLICT_MESSAGE);
    assert_eq!(server.value("user:1").unwrap(), b"theirs".to_vec());

    // the refresh shows the other client's value
    assert_eq!(viewer_text(&app), "theirs");
    assert_eq!(app.state(), AppState::Ready);
}

#[tokio::test]
async fn test_create_key_then_view_it() {
    let server = FakeMemcached::start().await;
    let mut app = ready_app(&server).await;

    app.update(key(KeyCode::Char('n')));
    type_text(&mut app, "fresh");
    assert!(app.update(key(KeyCode::Enter)).is_none());
    assert!(matches!(app.overlay(), Some(Overlay::Input(_))));

    type_text(&mut app, "hello");
    let set = app.update(key(KeyCode::Enter));
    assert!(matches!(set, Command::SetValue { .. }));
    drive(&mut app, set).await;

    assert_eq!(server.value("fresh").unwrap(), b"hello".to_vec());
    assert_eq!(app.tree().filtered_keys(), vec!["fresh"]);
    assert_eq!(app.viewer().unwrap().key(), "fresh");
    assert_eq!(viewer_text(&app), "hello");
}

#[tokio::test]
async fn test_new_key_name_is_validated() {
    let server = FakeMemcached::start().await;
    let mut app = ready_app(&server).await;

    app.update(key(KeyCode::Char('n')));
    type_text(&mut app, "bad key");
    assert!(app.update(key(KeyCode::Enter)).is_none());

    let Some(Overlay::Input(dialog)) = app.overlay() else {
        panic!("dialog closed on an invalid key");
    };
    assert!(dialog.error().is_some());
    assert_eq!(server.len(), 0);
}

// ============================================================================
// Deleting
// ============================================================================

#[tokio::test]
async fn test_single_delete() {
    let server = FakeMemcached::start().await;
    server.insert("a", b"1");
    server.insert("b", b"2");

    let mut app = ready_app(&server).await;
    open_key(&mut app, "a").await;

    app.update(key(KeyCode::Char('d')));
    assert!(matches!(app.overlay(), Some(Overlay::Confirm(_))));
    let delete = app.update(key(KeyCode::Char('y')));
    drive(&mut app, delete).await;

    assert!(!server.contains("a"));
    assert!(app.viewer().is_none());
    assert_eq!(app.tree().filtered_keys(), vec!["b"]);
    assert_eq!(app.status().unwrap().text, "Deleted a");
}

#[tokio::test]
async fn test_batch_delete_requires_exact_confirmation() {
    let server = FakeMemcached::start().await;
    server.insert("k1", b"1");
    server.insert("k2", b"2");
    server.insert("k3", b"3");
    server.insert("keep", b"4");

    let mut app = ready_app(&server).await;
    app.update(key(KeyCode::Home));
    for _ in 0..3 {
        app.update(key(KeyCode::Char(' ')));
        app.update(key(KeyCode::Down));
    }
    assert_eq!(app.tree().selected_keys(), vec!["k1", "k2", "k3"]);

    app.update(key(KeyCode::Char('d')));
    type_text(&mut app, "delete");
    assert!(app.update(key(KeyCode::Enter)).is_none());
    let Some(Overlay::Input(dialog)) = app.overlay() else {
        panic!("lowercase confirmation closed the dialog");
    };
    assert!(dialog.error().is_some());
    assert_eq!(server.len(), 4);

    for _ in 0.."delete".len() {
        app.update(key(KeyCode::Backspace));
    }
    type_text(&mut app, "DELETE");
    let batch = app.update(key(KeyCode::Enter));
    assert!(matches!(&batch, Command::BatchDelete { keys, .. } if keys.len() == 3));
    drive(&mut app, batch).await;

    assert_eq!(app.state(), AppState::Ready);
    assert_eq!(server.len(), 1);
    assert_eq!(app.tree().filtered_keys(), vec!["keep"]);
    assert!(!app.tree().has_selection());
    assert_eq!(app.status().unwrap().text, "Successfully deleted 3 keys");
}

// ============================================================================
// Clipboard
// ============================================================================

#[tokio::test]
async fn test_copy_value_and_key() {
    let server = FakeMemcached::start().await;
    server.insert("user:1", b"payload");

    let mut app = ready_app(&server).await;
    open_key(&mut app, "user:1").await;
    let clipboard = Arc::new(MemoryClipboard::new());

    let copy = app.update(key(KeyCode::Char('c')));
    drive_with(&mut app, copy, clipboard.clone()).await;
    assert_eq!(clipboard.last().as_deref(), Some("payload"));
    assert_eq!(app.status().unwrap().text, "Copied value to clipboard");

    app.update(key(KeyCode::Tab));
    assert_eq!(app.pane(), Pane::Viewer);
    let copy = app.update(key(KeyCode::Char('y')));
    drive_with(&mut app, copy, clipboard.clone()).await;
    assert_eq!(clipboard.last().as_deref(), Some("user:1"));
}

#[tokio::test]
async fn test_clipboard_failure_is_not_fatal() {
    let server = FakeMemcached::start().await;
    server.insert("k", b"v");

    let mut app = ready_app(&server).await;
    open_key(&mut app, "k").await;

    let copy = app.update(key(KeyCode::Char('y')));
    drive_with(&mut app, copy, Arc::new(MemoryClipboard::failing())).await;

    let status = app.status().unwrap();
    assert_eq!(status.level, StatusLevel::Warning);
    assert!(status.text.starts_with("Clipboard error"));
    assert_eq!(app.state(), AppState::Ready);
}

// ============================================================================
// Refresh
// ============================================================================

#[tokio::test]
async fn test_refresh_picks_up_external_changes() {
    let server = FakeMemcached::start().await;
    server.insert("a", b"1");

    let mut app = ready_app(&server).await;
    assert_eq!(app.tree().leaf_count(), 1);

    server.insert("b", b"2");
    let refresh = app.update(key(KeyCode::Char('r')));
    assert_eq!(app.state(), AppState::Loading);
    drive(&mut app, refresh).await;

    assert_eq!(app.state(), AppState::Ready);
    assert_eq!(app.tree().filtered_keys(), vec!["a", "b"]);
}

#[tokio::test]
async fn test_value_removed_elsewhere_closes_viewer() {
    let server = FakeMemcached::start().await;
    server.insert("a", b"1");
    server.insert("b", b"2");

    let mut app = ready_app(&server).await;
    open_key(&mut app, "a").await;
    assert!(app.viewer().is_some());

    server.remove("a");
    let refresh = app.update(key(KeyCode::Char('r')));
    drive(&mut app, refresh).await;

    assert!(app.viewer().is_none());
    assert_eq!(app.tree().filtered_keys(), vec!["b"]);
}

// ============================================================================
// Configuration
// ============================================================================

#[tokio::test]
async fn test_config_file_drives_connection_and_tree() {
    use std::io::Write;

    let server = FakeMemcached::start().await;
    server.insert("team/alpha", b"1");
    server.insert("team/beta", b"2");

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[server]\naddr = \"{}\"\nop_timeout_secs = 2\n\n[ui]\nkey_delimiter = \"/\"",
        server.addr()
    )
    .unwrap();
    let config = memtui::Config::load(Some(file.path())).unwrap();

    let mut app = App::new(config);
    let init = app.init();
    drive(&mut app, init).await;

    assert_eq!(app.state(), AppState::Ready);
    assert_eq!(app.addr(), server.addr());
    // one folder with two leaves under it
    let rows = app.tree().flattened();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].depth, 0);
    assert!(app.tree().node(rows[0].node).is_folder());
    assert_eq!(app.tree().node(rows[0].node).name, "team");
    assert!(rows[1..].iter().all(|row| row.depth == 1));
}
