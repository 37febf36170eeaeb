//! Yes/No confirmation dialog.

use crossterm::event::{KeyCode, KeyEvent};

use super::OverlayOutcome;
use crate::tui::message::{DialogContext, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmChoice {
    Yes,
    No,
}

#[derive(Debug, Clone)]
pub struct ConfirmDialog {
    pub title: String,
    pub message: String,
    focus: ConfirmChoice,
    context: DialogContext,
}

impl ConfirmDialog {
    /// Dialog focused on Yes.
    pub fn new(title: impl Into<String>, message: impl Into<String>, context: DialogContext) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            focus: ConfirmChoice::Yes,
            context,
        }
    }

    /// Dialog for a destructive operation: focus starts on No.
    pub fn destructive(
        title: impl Into<String>,
        message: impl Into<String>,
        context: DialogContext,
    ) -> Self {
        Self {
            focus: ConfirmChoice::No,
            ..Self::new(title, message, context)
        }
    }

    pub fn focus(&self) -> ConfirmChoice {
        self.focus
    }

    pub fn context(&self) -> &DialogContext {
        &self.context
    }

    fn resolve(&self, result: bool) -> OverlayOutcome {
        OverlayOutcome::Emit(Message::ConfirmResult {
            result,
            context: self.context.clone(),
        })
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> OverlayOutcome {
        match key.code {
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    ConfirmChoice::Yes => ConfirmChoice::No,
                    ConfirmChoice::No => ConfirmChoice::Yes,
                };
                OverlayOutcome::Consumed
            }
            KeyCode::Left => {
                self.focus = ConfirmChoice::Yes;
                OverlayOutcome::Consumed
            }
            KeyCode::Right => {
                self.focus = ConfirmChoice::No;
                OverlayOutcome::Consumed
            }
            KeyCode::Enter => self.resolve(self.focus == ConfirmChoice::Yes),
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => self.resolve(false),
            KeyCode::Char('y') | KeyCode::Char('Y') => self.resolve(true),
            _ => OverlayOutcome::Consumed,
        }
    }
}
