//! Error types for pomobot.

use thiserror::Error;

/// Errors that can occur anywhere in pomobot.
#[derive(Error, Debug)]
pub enum FocusError {
    /// A positional task index was outside `1..=len`.
    #[error("invalid task number")]
    InvalidIndex,

    /// A duration triple failed validation.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Cancel was requested but the user has no live timer.
    #[error("no active timer")]
    NoActiveTimer,

    /// Free-text input did not match the expected shape.
    #[error("could not parse input: {0}")]
    Parse(String),

    /// Durable state could not be loaded or saved.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// An outbound message could not be delivered.
    #[error("delivery failure: {0}")]
    Delivery(String),

    /// The assistant returned nothing usable.
    #[error("assistant failure: {0}")]
    Advice(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FocusError {
    /// Whether this error came from malformed user input.
    ///
    /// These are recovered by the conversation dispatcher and turned into a
    /// retry prompt, never propagated further.
    #[must_use]
    pub const fn is_user_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidIndex | Self::InvalidSettings(_) | Self::Parse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_input_classification() {
        assert!(FocusError::InvalidIndex.is_user_input());
        assert!(FocusError::InvalidSettings("zero".into()).is_user_input());
        assert!(FocusError::Parse("bad".into()).is_user_input());
        assert!(!FocusError::NoActiveTimer.is_user_input());
        assert!(!FocusError::Persistence("disk".into()).is_user_input());
        assert!(!FocusError::Delivery("gone".into()).is_user_input());
    }

    #[test]
    fn test_messages() {
        assert_eq!(FocusError::InvalidIndex.to_string(), "invalid task number");
        assert_eq!(FocusError::NoActiveTimer.to_string(), "no active timer");
    }
}
