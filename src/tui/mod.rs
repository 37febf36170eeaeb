//! memtui terminal UI
//!
//! An interactive browser and editor for a memcached server: a key tree on
//! the left, a value viewer on the right, and modal overlays for editing,
//! confirmation, the command palette and help.
//!
//! # Architecture
//!
//! - [`app`] - Application state and the `update` function
//! - [`message`] - Messages into `update` and the commands it returns
//! - [`scheduler`] - Runs commands as tasks and filters stale results
//! - [`runtime`] - Terminal setup and the event loop
//! - [`keytree`], [`viewer`], [`editor`], [`overlay`] - UI components
//! - [`ui`], [`widgets`] - Rendering
//! - [`clipboard`] - Clipboard capability

pub mod app;
pub mod clipboard;
pub mod editor;
pub mod keytree;
pub mod message;
pub mod overlay;
pub mod runtime;
pub mod scheduler;
pub mod ui;
pub mod viewer;
pub mod widgets;

pub use app::App;
pub use runtime::run;
