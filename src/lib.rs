//! # memtui
//!
//! Interactive terminal browser and editor for memcached.
//!
//! Everything that does not touch the terminal lives in [`memtui_core`]:
//! the protocol client, key enumeration, value classification and
//! formatting, configuration and errors. This crate adds the terminal UI.

pub mod tui;

pub use memtui_core::{config, error, Config, MemtuiError, Result};
