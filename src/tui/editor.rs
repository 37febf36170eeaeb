//! Value editor overlay.
//!
//! Edits one value as UTF-8 text. The CAS token captured when the value was
//! loaded travels with the save request; the app decides between `cas` and
//! a plain `set`.

use bytes::Bytes;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use thiserror::Error;

use memtui_core::format::{self, DataType, FormatError};
use memtui_core::CasItem;

/// Buffer interpretation; JSON enables the format action hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorOpenError {
    #[error("value of '{0}' is not valid UTF-8 and cannot be edited")]
    NotUtf8(String),
}

/// Payload of a save request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSave {
    pub key: String,
    pub value: Bytes,
    pub cas: Option<u64>,
}

/// What a key press asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorAction {
    None,
    Save(EditorSave),
    Cancel,
}

/// Multi-line text with a character-indexed cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    lines: Vec<String>,
    row: usize,
    col: usize,
}

impl TextBuffer {
    pub fn new(text: &str) -> Self {
        let mut buffer = Self::default();
        buffer.set_text(text);
        buffer
    }

    pub fn set_text(&mut self, text: &str) {
        self.lines = text.split('\n').map(str::to_string).collect();
        self.row = 0;
        self.col = 0;
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// `(row, column)` in characters.
    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    fn line_len(&self, row: usize) -> usize {
        self.lines.get(row).map_or(0, |l| l.chars().count())
    }

    fn byte_index(&self, row: usize, col: usize) -> usize {
        let line = &self.lines[row];
        line.char_indices().nth(col).map_or(line.len(), |(i, _)| i)
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.row, self.col);
        self.lines[self.row].insert(at, c);
        self.col += 1;
    }

    pub fn insert_newline(&mut self) {
        let at = self.byte_index(self.row, self.col);
        let rest = self.lines[self.row].split_off(at);
        self.lines.insert(self.row + 1, rest);
        self.row += 1;
        self.col = 0;
    }

    pub fn backspace(&mut self) {
        if self.col > 0 {
            let at = self.byte_index(self.row, self.col - 1);
            self.lines[self.row].remove(at);
            self.col -= 1;
        } else if self.row > 0 {
            let line = self.lines.remove(self.row);
            self.row -= 1;
            self.col = self.line_len(self.row);
            self.lines[self.row].push_str(&line);
        }
    }

    pub fn delete(&mut self) {
        if self.col < self.line_len(self.row) {
            let at = self.byte_index(self.row, self.col);
            self.lines[self.row].remove(at);
        } else if self.row + 1 < self.lines.len() {
            let next = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&next);
        }
    }

    pub fn left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = self.line_len(self.row);
        }
    }

    pub fn right(&mut self) {
        if self.col < self.line_len(self.row) {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub fn up(&mut self) {
        if self.row > 0 {
            self.row -= 1;
            self.col = self.col.min(self.line_len(self.row));
        }
    }

    pub fn down(&mut self) {
        if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = self.col.min(self.line_len(self.row));
        }
    }

    pub fn home(&mut self) {
        self.col = 0;
    }

    pub fn end(&mut self) {
        self.col = self.line_len(self.row);
    }
}

#[derive(Debug)]
pub struct Editor {
    key: String,
    original: Bytes,
    buffer: TextBuffer,
    dirty: bool,
    mode: EditorMode,
    cas: Option<u64>,
    error: Option<String>,
    scroll: usize,
}

impl Editor {
    /// Open `item` for editing, capturing its CAS token.
    pub fn open(item: &CasItem) -> Result<Self, EditorOpenError> {
        let text = std::str::from_utf8(&item.value)
            .map_err(|_| EditorOpenError::NotUtf8(item.key.clone()))?;
        let mode = if format::classify(&item.value) == DataType::Json {
            EditorMode::Json
        } else {
            EditorMode::Text
        };
        Ok(Self {
            key: item.key.clone(),
            original: item.value.clone(),
            buffer: TextBuffer::new(text),
            dirty: false,
            mode,
            cas: (item.cas != 0).then_some(item.cas),
            error: None,
            scroll: 0,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn cas(&self) -> Option<u64> {
        self.cas
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Keep the cursor row inside a window of `height` rows.
    pub fn scroll_to_cursor(&mut self, height: usize) {
        let (row, _) = self.buffer.cursor();
        let height = height.max(1);
        if row < self.scroll {
            self.scroll = row;
        } else if row >= self.scroll + height {
            self.scroll = row + 1 - height;
        }
    }

    pub fn current_bytes(&self) -> Bytes {
        Bytes::from(self.buffer.text())
    }

    pub fn set_text(&mut self, text: &str) {
        self.buffer.set_text(text);
        self.refresh_dirty();
    }

    fn refresh_dirty(&mut self) {
        self.dirty = self.buffer.text().as_bytes() != self.original.as_ref();
    }

    /// Reformat the buffer as pretty JSON. The buffer is untouched on error.
    pub fn format_json(&mut self) -> Result<(), FormatError> {
        match format::format_json(self.buffer.text().as_bytes()) {
            Ok(pretty) => {
                self.buffer.set_text(&pretty);
                self.mode = EditorMode::Json;
                self.error = None;
                self.refresh_dirty();
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub fn save(&self) -> EditorSave {
        EditorSave {
            key: self.key.clone(),
            value: self.current_bytes(),
            cas: self.cas,
        }
    }

    /// Ctrl+S saves, Esc cancels, Ctrl+F formats JSON; everything else edits.
    pub fn handle_key(&mut self, key: KeyEvent) -> EditorAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('s') if ctrl => return EditorAction::Save(self.save()),
            KeyCode::Char('f') if ctrl => {
                let _ = self.format_json();
                return EditorAction::None;
            }
            KeyCode::Esc => return EditorAction::Cancel,
            _ => {}
        }

        self.error = None;
        let edited = match key.code {
            KeyCode::Char(c) if !ctrl => {
                self.buffer.insert_char(c);
                true
            }
            KeyCode::Tab => {
                for _ in 0..2 {
                    self.buffer.insert_char(' ');
                }
                true
            }
            KeyCode::Enter => {
                self.buffer.insert_newline();
                true
            }
            KeyCode::Backspace => {
                self.buffer.backspace();
                true
            }
            KeyCode::Delete => {
                self.buffer.delete();
                true
            }
            KeyCode::Left => {
                self.buffer.left();
                false
            }
            KeyCode::Right => {
                self.buffer.right();
                false
            }
            KeyCode::Up => {
                self.buffer.up();
                false
            }
            KeyCode::Down => {
                self.buffer.down();
                false
            }
            KeyCode::Home => {
                self.buffer.home();
                false
            }
            KeyCode::End => {
                self.buffer.end();
                false
            }
            _ => false,
        };
        if edited {
            self.refresh_dirty();
        }
        EditorAction::None
    }
}
