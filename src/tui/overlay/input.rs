//! Text input dialog with optional validation.

use crossterm::event::{KeyCode, KeyEvent};

use super::text_input::TextInput;
use super::OverlayOutcome;
use crate::tui::message::{DialogContext, Message};

/// Returns an error message when the input is unacceptable.
pub type Validator = fn(&str) -> Result<(), String>;

#[derive(Debug, Clone)]
pub struct InputDialog {
    pub title: String,
    pub placeholder: String,
    input: TextInput,
    validator: Option<Validator>,
    error: Option<String>,
    context: DialogContext,
}

impl InputDialog {
    pub fn new(title: impl Into<String>, context: DialogContext) -> Self {
        Self {
            title: title.into(),
            placeholder: String::new(),
            input: TextInput::new(""),
            validator: None,
            error: None,
            context,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.input.set_value(value);
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn input(&self) -> &TextInput {
        &self.input
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn context(&self) -> &DialogContext {
        &self.context
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> OverlayOutcome {
        match key.code {
            KeyCode::Enter => {
                if let Some(validate) = self.validator {
                    if let Err(e) = validate(self.input.value()) {
                        self.error = Some(e);
                        return OverlayOutcome::Consumed;
                    }
                }
                OverlayOutcome::Emit(Message::InputResult {
                    value: self.input.value().to_string(),
                    cancelled: false,
                    context: self.context.clone(),
                })
            }
            KeyCode::Esc => OverlayOutcome::Emit(Message::InputResult {
                value: self.input.value().to_string(),
                cancelled: true,
                context: self.context.clone(),
            }),
            _ => {
                self.error = None;
                self.input.handle_key(key);
                OverlayOutcome::Consumed
            }
        }
    }
}
