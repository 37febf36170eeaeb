//! Value viewer pane.
//!
//! Holds one fetched value with its metadata. Detection and decompression
//! run once on load; switching modes only re-renders.

use bytes::Bytes;
use crossterm::event::{KeyCode, KeyEvent};

use memtui_core::format::{self, Analysis, DataType, ViewMode};
use memtui_core::model::now_unix;
use memtui_core::{CasItem, KeyRecord};

use super::widgets::format_bytes;

/// Rows used by the header, the metadata line and the rule.
pub const HEADER_ROWS: usize = 3;

#[derive(Debug)]
pub struct Viewer {
    record: KeyRecord,
    value: Bytes,
    flags: u32,
    cas: u64,
    analysis: Analysis,
    mode: ViewMode,
    lines: Vec<String>,
    render_error: Option<String>,
    offset: usize,
    width: usize,
    height: usize,
}

impl Viewer {
    pub fn new(record: KeyRecord, item: &CasItem, max_decompressed: usize) -> Self {
        let analysis = format::analyze(&item.value, max_decompressed);
        let mut viewer = Self {
            record,
            value: item.value.clone(),
            flags: item.flags,
            cas: item.cas,
            analysis,
            mode: ViewMode::Auto,
            lines: Vec::new(),
            render_error: None,
            offset: 0,
            width: 80,
            height: 24,
        };
        viewer.rerender();
        viewer
    }

    pub fn key(&self) -> &str {
        &self.record.key
    }

    pub fn record(&self) -> &KeyRecord {
        &self.record
    }

    pub fn value(&self) -> &Bytes {
        &self.value
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn detected(&self) -> DataType {
        self.analysis.detected
    }

    pub fn analysis(&self) -> &Analysis {
        &self.analysis
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Renderer failure for the current mode (e.g. JSON mode on non-JSON).
    pub fn render_error(&self) -> Option<&str> {
        self.render_error.as_deref()
    }

    pub fn set_size(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.clamp();
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        if mode != self.mode {
            self.mode = mode;
            self.offset = 0;
            self.rerender();
        }
    }

    fn rerender(&mut self) {
        match format::render(&self.value, &self.analysis, self.mode) {
            Ok(text) => {
                self.lines = text.lines().map(str::to_string).collect();
                self.render_error = None;
            }
            Err(e) => {
                self.lines = vec![e.to_string()];
                self.render_error = Some(e.to_string());
            }
        }
        self.clamp();
    }

    /// Header line.
    pub fn header(&self) -> String {
        format!("Key: {}", self.record.key)
    }

    /// Metadata line: size, detected type, mode, TTL, flags, CAS.
    pub fn metadata(&self) -> String {
        let mut kind = self.analysis.detected.to_string();
        if let Some((_, inner)) = &self.analysis.inner {
            kind = format!("{} ({})", kind, inner);
        }
        let ttl = match self.record.remaining_ttl(now_unix()) {
            0 if self.record.expiration == 0 => "none".to_string(),
            0 => "expired".to_string(),
            secs => format!("{}s", secs),
        };
        format!(
            "Size: {} | Type: {} | Mode: {} | TTL: {} | Flags: {} | CAS: {}",
            format_bytes(self.value.len() as u64),
            kind,
            self.mode,
            ttl,
            self.flags,
            self.cas
        )
    }

    /// Rows available for content.
    pub fn visible_lines(&self) -> usize {
        self.height.saturating_sub(HEADER_ROWS)
    }

    fn page(&self) -> usize {
        self.height.saturating_sub(4).max(1)
    }

    fn max_offset(&self) -> usize {
        self.lines.len().saturating_sub(self.visible_lines())
    }

    fn clamp(&mut self) {
        self.offset = self.offset.min(self.max_offset());
    }

    pub fn scroll_up(&mut self, n: usize) {
        self.offset = self.offset.saturating_sub(n);
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.offset = self.offset.saturating_add(n).min(self.max_offset());
    }

    /// Content lines currently in view.
    pub fn visible(&self) -> &[String] {
        let end = (self.offset + self.visible_lines()).min(self.lines.len());
        &self.lines[self.offset.min(end)..end]
    }

    /// Viewer bindings. Returns whether the key was used.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(c @ ('J' | 'H' | 'T' | 'A')) => {
                if let Some(mode) = ViewMode::from_key(c) {
                    self.set_mode(mode);
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.scroll_up(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_down(1),
            KeyCode::PageUp => self.scroll_up(self.page()),
            KeyCode::PageDown => self.scroll_down(self.page()),
            KeyCode::Home => self.offset = 0,
            KeyCode::End => self.offset = self.max_offset(),
            _ => return false,
        }
        true
    }
}
