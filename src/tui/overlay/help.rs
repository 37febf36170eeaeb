//! Keybinding reference panel.

use crossterm::event::{KeyCode, KeyEvent};

use super::OverlayOutcome;

/// `(group, [(keys, description)])`
pub const HELP_SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Global",
        &[
            ("q / Ctrl+C", "Quit"),
            ("Ctrl+P", "Command palette"),
            ("?", "Toggle this help"),
            ("Tab", "Switch between key list and viewer"),
            ("r", "Refresh keys (retry when disconnected)"),
            ("/", "Filter keys"),
        ],
    ),
    (
        "Key list",
        &[
            ("Up/Down, j/k", "Move"),
            ("PgUp/PgDn, Home/End", "Jump"),
            ("Left/Right, h/l", "Collapse / expand folder"),
            ("Enter", "Open value or toggle folder"),
            ("Space", "Select key for batch delete"),
            ("Esc", "Clear selection"),
        ],
    ),
    (
        "Viewer",
        &[
            ("A / J / H / T", "Auto / JSON / hex / text"),
            ("Up/Down, PgUp/PgDn", "Scroll"),
            ("Esc", "Back to key list"),
        ],
    ),
    (
        "Keys",
        &[
            ("n", "New key"),
            ("e", "Edit current value"),
            ("d", "Delete current or selected keys"),
            ("c", "Copy value"),
            ("y", "Copy key name"),
        ],
    ),
    (
        "Editor",
        &[
            ("Ctrl+S", "Save (uses CAS when available)"),
            ("Ctrl+F", "Format as JSON"),
            ("Esc", "Cancel"),
        ],
    ),
];

#[derive(Debug, Clone, Default)]
pub struct HelpPanel {
    scroll: usize,
}

impl HelpPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Rendered lines.
    pub fn lines() -> Vec<String> {
        let mut lines = Vec::new();
        for (group, bindings) in HELP_SECTIONS {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push((*group).to_string());
            for (keys, description) in bindings.iter() {
                lines.push(format!("  {:<22} {}", keys, description));
            }
        }
        lines
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> OverlayOutcome {
        match key.code {
            KeyCode::Char('?') | KeyCode::Esc => OverlayOutcome::Close,
            KeyCode::Up | KeyCode::Char('k') => {
                self.scroll = self.scroll.saturating_sub(1);
                OverlayOutcome::Consumed
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll = (self.scroll + 1).min(Self::lines().len().saturating_sub(1));
                OverlayOutcome::Consumed
            }
            _ => OverlayOutcome::Consumed,
        }
    }
}
