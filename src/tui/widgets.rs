//! Reusable widget components for the memtui panes.
//!
//! - [`KeyTreeView`] - folder/leaf tree with cursor and selection marks
//! - [`ValueView`] - header, metadata and formatted value
//! - [`EditorView`] - multi-line buffer with a visible cursor
//! - [`DialogFrame`] - bordered popup used by every dialog

use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use memtui_core::format::DataType;

use super::app::StatusLevel;
use super::editor::{Editor, EditorMode};
use super::keytree::{KeyTree, NodeKind};
use super::viewer::Viewer;

// ── KeyTreeView ─────────────────────────────────────────────────────────────

/// The key list. Rows come from the tree's own scroll window.
pub struct KeyTreeView<'a> {
    pub tree: &'a KeyTree,
    pub focused: bool,
    /// Pattern shown in the title while filtering
    pub filter: Option<&'a str>,
}

impl<'a> KeyTreeView<'a> {
    pub fn new(tree: &'a KeyTree, focused: bool) -> Self {
        Self {
            tree,
            focused,
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: Option<&'a str>) -> Self {
        self.filter = filter;
        self
    }

    /// Text of one row, without styling.
    pub fn row_text(tree: &KeyTree, index: usize) -> String {
        let Some(entry) = tree.flattened().get(index) else {
            return String::new();
        };
        let node = tree.node(entry.node);
        let indent = "  ".repeat(entry.depth);
        match &node.kind {
            NodeKind::Folder { expanded, .. } => {
                let arrow = if *expanded { "▾" } else { "▸" };
                format!("{}{} {}/", indent, arrow, node.name)
            }
            NodeKind::Leaf { .. } => {
                let selected = tree
                    .record(entry.node)
                    .is_some_and(|r| tree.is_selected(&r.key));
                let mark = if selected { "[x]" } else { "   " };
                format!("{}{} {}", indent, mark, node.name)
            }
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let tree = self.tree;
        let lines: Vec<Line> = (tree.offset()..tree.offset() + tree.visible_rows().len())
            .map(|index| {
                let text = Self::row_text(tree, index);
                let is_folder = tree
                    .flattened()
                    .get(index)
                    .is_some_and(|e| tree.node(e.node).is_folder());
                let mut style = if is_folder {
                    Style::default().fg(Color::Cyan)
                } else {
                    Style::default()
                };
                if index == tree.cursor() {
                    style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
                }
                Line::from(Span::styled(text, style))
            })
            .collect();

        let mut title = format!(" Keys ({}) ", tree.leaf_count());
        if tree.has_selection() {
            title = format!(" Keys ({}, {} selected) ", tree.leaf_count(), tree.selection_len());
        }
        if let Some(filter) = self.filter.filter(|f| !f.is_empty()) {
            title.push_str(&format!("[/{}] ", filter));
        }

        let body = if lines.is_empty() {
            vec![Line::from(Span::styled(
                "No keys",
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            lines
        };
        let paragraph = Paragraph::new(body).block(pane_block(title, self.focused));
        f.render_widget(paragraph, area);
    }
}

// ── ValueView ───────────────────────────────────────────────────────────────

pub struct ValueView<'a> {
    pub viewer: Option<&'a Viewer>,
    pub focused: bool,
}

impl<'a> ValueView<'a> {
    pub fn new(viewer: Option<&'a Viewer>, focused: bool) -> Self {
        Self { viewer, focused }
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let block = pane_block(" Value ".to_string(), self.focused);
        let Some(viewer) = self.viewer else {
            let hint = Paragraph::new(Line::from(Span::styled(
                "Select a key and press Enter",
                Style::default().fg(Color::DarkGray),
            )))
            .block(block);
            f.render_widget(hint, area);
            return;
        };

        let rule_width = area.width.saturating_sub(2) as usize;
        let mut lines = vec![
            Line::from(Span::styled(
                viewer.header(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                viewer.metadata(),
                Style::default().fg(data_type_color(viewer.detected())),
            )),
            Line::from(Span::styled(
                "─".repeat(rule_width),
                Style::default().fg(Color::DarkGray),
            )),
        ];
        let body_style = if viewer.render_error().is_some() {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        };
        lines.extend(
            viewer
                .visible()
                .iter()
                .map(|l| Line::from(Span::styled(l.as_str(), body_style))),
        );

        f.render_widget(Paragraph::new(lines).block(block), area);
    }
}

// ── EditorView ──────────────────────────────────────────────────────────────

pub struct EditorView<'a> {
    pub editor: &'a Editor,
}

impl<'a> EditorView<'a> {
    pub fn new(editor: &'a Editor) -> Self {
        Self { editor }
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let editor = self.editor;
        let mode = match editor.mode() {
            EditorMode::Text => "text",
            EditorMode::Json => "json",
        };
        let dirty = if editor.is_dirty() { " *" } else { "" };
        let title = format!(" Edit {} [{}]{} ", editor.key(), mode, dirty);

        f.render_widget(Clear, area);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(title);
        let inner = block.inner(area);
        f.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(inner);

        let height = chunks[0].height as usize;
        let lines: Vec<Line> = editor
            .buffer()
            .lines()
            .iter()
            .skip(editor.scroll())
            .take(height)
            .map(|l| Line::from(l.as_str()))
            .collect();
        f.render_widget(Paragraph::new(lines), chunks[0]);

        let footer = match editor.error() {
            Some(error) => Line::from(Span::styled(error, Style::default().fg(Color::Red))),
            None => Line::from(Span::styled(
                " Ctrl+S:save  Ctrl+F:format JSON  Esc:cancel ",
                Style::default().fg(Color::DarkGray),
            )),
        };
        f.render_widget(Paragraph::new(footer), chunks[1]);

        let (row, col) = editor.buffer().cursor();
        if row >= editor.scroll() && row < editor.scroll() + height {
            let x = chunks[0].x + (col as u16).min(chunks[0].width.saturating_sub(1));
            let y = chunks[0].y + (row - editor.scroll()) as u16;
            f.set_cursor_position(Position::new(x, y));
        }
    }
}

// ── DialogFrame ─────────────────────────────────────────────────────────────

/// A cleared, bordered popup. Returns the inner area for content.
pub struct DialogFrame<'a> {
    pub title: &'a str,
    pub color: Color,
}

impl<'a> DialogFrame<'a> {
    pub fn new(title: &'a str) -> Self {
        Self {
            title,
            color: Color::Cyan,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn render(&self, f: &mut Frame, area: Rect) -> Rect {
        f.render_widget(Clear, area);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.color))
            .title(format!(" {} ", self.title));
        let inner = block.inner(area);
        f.render_widget(block, area);
        inner
    }
}

/// Wrapped paragraph helper for dialog bodies.
pub fn dialog_text<'a>(lines: Vec<Line<'a>>) -> Paragraph<'a> {
    Paragraph::new(lines).wrap(Wrap { trim: false })
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn pane_block(title: String, focused: bool) -> Block<'static> {
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(title)
}

/// Color for a detected value type.
pub fn data_type_color(kind: DataType) -> Color {
    match kind {
        DataType::Json => Color::Green,
        DataType::Text => Color::White,
        DataType::Binary => Color::Magenta,
        DataType::Gzip | DataType::Zlib => Color::Yellow,
    }
}

/// Color for a status line message.
pub fn status_color(level: StatusLevel) -> Color {
    match level {
        StatusLevel::Info => Color::Green,
        StatusLevel::Warning => Color::Yellow,
        StatusLevel::Error => Color::Red,
    }
}

/// Format a byte count as "512B", "1.5KB", "3.0MB" or "1.2GB".
pub fn format_bytes(bytes: u64) -> String {
    if bytes >= 1024 * 1024 * 1024 {
        format!("{:.1}GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    } else if bytes >= 1024 * 1024 {
        format!("{:.1}MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1}KB", bytes as f64 / 1024.0)
    } else {
        format!("{}B", bytes)
    }
}

/// Create a centered rectangle for popups/dialogs.
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// A centered rectangle with a fixed height, clamped to `r`.
pub fn centered_fixed(percent_x: u16, height: u16, r: Rect) -> Rect {
    let height = height.min(r.height);
    let columns = centered_rect(percent_x, 100, r);
    Rect::new(
        columns.x,
        r.y + (r.height - height) / 2,
        columns.width,
        height,
    )
}

// ── Tests ───────────────────────────────────────────────────────────────────
