//! Input validation for key names and destructive confirmations
//!
//! Keys are checked before they reach the wire: memcached's text protocol
//! cannot carry whitespace or control characters inside a key.

use thiserror::Error;

/// Maximum key length accepted by memcached.
pub const MAX_KEY_LENGTH: usize = 250;

/// Literal the user must type to confirm a batch delete.
pub const BATCH_DELETE_CONFIRMATION: &str = "DELETE";

/// Why a key name was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyValidationError {
    #[error("key cannot be empty")]
    Empty,

    #[error("key is {len} bytes (max {max})")]
    TooLong { len: usize, max: usize },

    #[error("key contains a space at position {position}")]
    Space { position: usize },

    #[error("key contains {name} at position {position}")]
    Whitespace { name: &'static str, position: usize },

    #[error("key contains control character 0x{byte:02x} at position {position}")]
    Control { byte: u8, position: usize },
}

/// Validate a key name. Positions are byte offsets.
pub fn validate_key(key: &str) -> Result<(), KeyValidationError> {
    if key.is_empty() {
        return Err(KeyValidationError::Empty);
    }
    for (position, byte) in key.bytes().enumerate() {
        match byte {
            b' ' => return Err(KeyValidationError::Space { position }),
            b'\n' => {
                return Err(KeyValidationError::Whitespace {
                    name: "a newline",
                    position,
                })
            }
            b'\r' => {
                return Err(KeyValidationError::Whitespace {
                    name: "a carriage return",
                    position,
                })
            }
            b'\t' => {
                return Err(KeyValidationError::Whitespace {
                    name: "a tab",
                    position,
                })
            }
            0x0b => {
                return Err(KeyValidationError::Whitespace {
                    name: "a vertical tab",
                    position,
                })
            }
            0x0c => {
                return Err(KeyValidationError::Whitespace {
                    name: "a form feed",
                    position,
                })
            }
            b if b < 0x20 || b == 0x7f => {
                return Err(KeyValidationError::Control { byte: b, position })
            }
            _ => {}
        }
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(KeyValidationError::TooLong {
            len: key.len(),
            max: MAX_KEY_LENGTH,
        });
    }
    Ok(())
}

/// Validator-shaped wrapper used by input dialogs.
pub fn key_name_validator(input: &str) -> Result<(), String> {
    validate_key(input).map_err(|e| e.to_string())
}

/// Exact, case-sensitive match on [`BATCH_DELETE_CONFIRMATION`].
pub fn batch_delete_validator(input: &str) -> Result<(), String> {
    if input == BATCH_DELETE_CONFIRMATION {
        Ok(())
    } else {
        Err(format!(
            "type {} (uppercase) to confirm",
            BATCH_DELETE_CONFIRMATION
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_keys() {
        assert!(validate_key("user:1").is_ok());
        assert!(validate_key("a").is_ok());
        assert!(validate_key(&"k".repeat(MAX_KEY_LENGTH)).is_ok());
        assert!(validate_key("ünïcode/ok").is_ok());
    }

    #[test]
    fn test_empty_key() {
        assert_eq!(validate_key(""), Err(KeyValidationError::Empty));
    }

    #[test]
    fn test_too_long() {
        let key = "k".repeat(MAX_KEY_LENGTH + 1);
        assert_eq!(
            validate_key(&key),
            Err(KeyValidationError::TooLong { len: 251, max: 250 })
        );
    }

    #[test]
    fn test_whitespace_positions() {
        assert_eq!(
            validate_key("ab cd"),
            Err(KeyValidationError::Space { position: 2 })
        );
        assert_eq!(
            validate_key("a\nb"),
            Err(KeyValidationError::Whitespace {
                name: "a newline",
                position: 1
            })
        );
        assert_eq!(
            validate_key("\rb"),
            Err(KeyValidationError::Whitespace {
                name: "a carriage return",
                position: 0
            })
        );
        assert!(matches!(
            validate_key("a\tb"),
            Err(KeyValidationError::Whitespace { name: "a tab", .. })
        ));
        assert!(matches!(
            validate_key("a\x0bb"),
            Err(KeyValidationError::Whitespace {
                name: "a vertical tab",
                ..
            })
        ));
        assert!(matches!(
            validate_key("a\x0cb"),
            Err(KeyValidationError::Whitespace {
                name: "a form feed",
                ..
            })
        ));
    }

    #[test]
    fn test_control_characters() {
        assert_eq!(
            validate_key("ab\x01"),
            Err(KeyValidationError::Control {
                byte: 0x01,
                position: 2
            })
        );
        assert!(validate_key("x\x7f").is_err());
    }

    #[test]
    fn test_error_messages_name_position() {
        let msg = key_name_validator("my key").unwrap_err();
        assert_eq!(msg, "key contains a space at position 2");
        let msg = key_name_validator("k\x02").unwrap_err();
        assert_eq!(msg, "key contains control character 0x02 at position 1");
    }

    #[test]
    fn test_batch_delete_validator() {
        assert!(batch_delete_validator("DELETE").is_ok());
        assert!(batch_delete_validator("delete").is_err());
        assert!(batch_delete_validator(" DELETE").is_err());
        assert!(batch_delete_validator("DELETE ").is_err());
        assert!(batch_delete_validator("").is_err());
    }
}
