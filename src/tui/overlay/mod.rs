//! Modal overlays: dialogs, the editor, the command palette and help.
//!
//! At most one overlay is open. While open it receives every key event and
//! answers with an [`OverlayOutcome`].

pub mod confirm;
pub mod fuzzy;
pub mod help;
pub mod input;
pub mod palette;
pub mod text_input;

use crossterm::event::KeyEvent;

pub use confirm::{ConfirmChoice, ConfirmDialog};
pub use help::HelpPanel;
pub use input::{InputDialog, Validator};
pub use palette::{CommandPalette, PaletteCommand};
pub use text_input::TextInput;

use super::editor::{Editor, EditorAction};
use super::message::Message;

/// Response of an overlay to a key.
#[derive(Debug)]
pub enum OverlayOutcome {
    /// Key handled, overlay stays open
    Consumed,
    /// Close without a result
    Close,
    /// Close and deliver a message
    Emit(Message),
}

#[derive(Debug)]
pub enum Overlay {
    Confirm(ConfirmDialog),
    Input(InputDialog),
    Palette(CommandPalette),
    Help(HelpPanel),
    Editor(Editor),
}

impl Overlay {
    pub fn name(&self) -> &'static str {
        match self {
            Overlay::Confirm(_) => "confirm",
            Overlay::Input(_) => "input",
            Overlay::Palette(_) => "palette",
            Overlay::Help(_) => "help",
            Overlay::Editor(_) => "editor",
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> OverlayOutcome {
        match self {
            Overlay::Confirm(dialog) => dialog.handle_key(key),
            Overlay::Input(dialog) => dialog.handle_key(key),
            Overlay::Palette(palette) => palette.handle_key(key),
            Overlay::Help(help) => help.handle_key(key),
            Overlay::Editor(editor) => match editor.handle_key(key) {
                EditorAction::None => OverlayOutcome::Consumed,
                EditorAction::Save(save) => OverlayOutcome::Emit(Message::EditorSave(save)),
                EditorAction::Cancel => OverlayOutcome::Emit(Message::EditorCancel),
            },
        }
    }
}
