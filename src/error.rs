use thiserror::Error;

use crate::quiz::roadmap::GateError;

/// Longest error text ever shown to a user in chat.
pub const MAX_USER_ERROR_LEN: usize = 300;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InputValidation(String),

    #[error(transparent)]
    Gate(#[from] GateError),

    #[error("AI service error: {0}")]
    Upstream(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Inline chat message for an error caught in a handler.
    pub fn user_message(&self) -> String {
        let text = match self {
            AppError::Gate(gate) => format!("🔒 {}", gate),
            AppError::Upstream(_) => format!("⚠️ {}\nPress the button again to retry.", self),
            other => format!("⚠️ {}", other),
        };
        truncate_chars(&text, MAX_USER_ERROR_LEN)
    }
}

impl From<chatgpt::err::Error> for AppError {
    fn from(err: chatgpt::err::Error) -> Self {
        AppError::Upstream(err.to_string())
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_message_is_bounded() {
        let err = AppError::Upstream("x".repeat(2_000));
        let msg = err.user_message();
        assert_eq!(msg.chars().count(), MAX_USER_ERROR_LEN);
        assert!(msg.ends_with('…'));
    }

    #[test]
    fn test_short_message_kept_verbatim() {
        let err = AppError::InputValidation("expected three numbers".into());
        assert_eq!(err.user_message(), "⚠️ Invalid input: expected three numbers");
    }

    #[test]
    fn test_gate_error_converts() {
        let err: AppError = GateError::BelowThreshold { xp: 10, required: 50 }.into();
        assert!(matches!(err, AppError::Gate(_)));
        assert!(err.user_message().starts_with("🔒"));
    }
}
