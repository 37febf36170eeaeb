//! Command palette: fuzzy-ranked action lookup.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use memtui_core::format::ViewMode;

use super::fuzzy;
use super::text_input::TextInput;
use super::OverlayOutcome;
use crate::tui::message::{AppAction, Message};

/// One palette entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteCommand {
    pub name: &'static str,
    pub description: &'static str,
    /// Display hint only
    pub shortcut: &'static str,
    pub action: AppAction,
}

const fn command(
    name: &'static str,
    description: &'static str,
    shortcut: &'static str,
    action: AppAction,
) -> PaletteCommand {
    PaletteCommand {
        name,
        description,
        shortcut,
        action,
    }
}

/// Every action the palette offers, in display order for an empty query.
pub const COMMANDS: &[PaletteCommand] = &[
    command("Refresh", "Reload the key list from the server", "r", AppAction::Refresh),
    command("New key", "Create a key with a value", "n", AppAction::NewKey),
    command("Delete", "Delete the current or selected keys", "d", AppAction::Delete),
    command("Edit value", "Open the current value in the editor", "e", AppAction::Edit),
    command("Filter keys", "Show only keys containing a pattern", "/", AppAction::Filter),
    command("Copy key", "Copy the key name to the clipboard", "y", AppAction::CopyKey),
    command("Copy value", "Copy the current value to the clipboard", "c", AppAction::CopyValue),
    command("View auto", "Pick the rendering from the detected type", "A", AppAction::View(ViewMode::Auto)),
    command("View JSON", "Render the value as pretty JSON", "J", AppAction::View(ViewMode::Json)),
    command("View hex", "Render the value as a hex dump", "H", AppAction::View(ViewMode::Hex)),
    command("View text", "Render the value as plain text", "T", AppAction::View(ViewMode::Text)),
    command("Expand all", "Expand every folder in the key tree", "", AppAction::ExpandAll),
    command("Collapse all", "Collapse every folder in the key tree", "", AppAction::CollapseAll),
    command("Clear selection", "Unselect all selected keys", "Esc", AppAction::ClearSelection),
    command("Help", "Show keybindings", "?", AppAction::Help),
    command("Quit", "Exit memtui", "q", AppAction::Quit),
];

#[derive(Debug, Clone)]
pub struct CommandPalette {
    commands: &'static [PaletteCommand],
    input: TextInput,
    /// Indices into `commands`, best first, at most `max_results`
    matches: Vec<usize>,
    selected: usize,
    max_results: usize,
}

impl CommandPalette {
    pub fn new(max_results: usize) -> Self {
        Self::with_commands(COMMANDS, max_results)
    }

    pub fn with_commands(commands: &'static [PaletteCommand], max_results: usize) -> Self {
        let mut palette = Self {
            commands,
            input: TextInput::new(""),
            matches: Vec::new(),
            selected: 0,
            max_results: max_results.max(1),
        };
        palette.refilter();
        palette
    }

    pub fn query(&self) -> &str {
        self.input.value()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Ranked entries currently shown.
    pub fn matches(&self) -> impl Iterator<Item = &PaletteCommand> + '_ {
        self.matches.iter().map(|&i| &self.commands[i])
    }

    pub fn highlighted(&self) -> Option<&PaletteCommand> {
        self.matches.get(self.selected).map(|&i| &self.commands[i])
    }

    fn refilter(&mut self) {
        let ranked = fuzzy::rank(
            self.input.value(),
            self.commands.iter().map(|c| (c.name, c.description)),
        );
        self.matches = ranked
            .into_iter()
            .take(self.max_results)
            .map(|(index, _)| index)
            .collect();
        self.selected = 0;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> OverlayOutcome {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => OverlayOutcome::Emit(Message::CommandCancel),
            KeyCode::Enter => match self.highlighted() {
                Some(command) => OverlayOutcome::Emit(Message::CommandExecute(command.action)),
                None => OverlayOutcome::Consumed,
            },
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                OverlayOutcome::Consumed
            }
            KeyCode::Char('p') if ctrl => {
                self.selected = self.selected.saturating_sub(1);
                OverlayOutcome::Consumed
            }
            KeyCode::Down | KeyCode::Tab => {
                self.selected = (self.selected + 1).min(self.matches.len().saturating_sub(1));
                OverlayOutcome::Consumed
            }
            KeyCode::Char('n') if ctrl => {
                self.selected = (self.selected + 1).min(self.matches.len().saturating_sub(1));
                OverlayOutcome::Consumed
            }
            _ => {
                if self.input.handle_key(key) {
                    self.refilter();
                }
                OverlayOutcome::Consumed
            }
        }
    }
}
