use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidEmail,
    WeakPassword,
    PasswordMismatch,
    EmailInUse,
    InvalidCredential,
}

/// Failure reported by the identity provider or the registration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code:?}: {message}")]
pub struct AuthError {
    pub code: ErrorCode,
    pub message: String,
}

impl AuthError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Text shown next to the form, mirroring the hosted provider's wording.
    pub fn user_message(&self) -> String {
        match self.code {
            ErrorCode::PasswordMismatch => "Passwords do not match".to_string(),
            ErrorCode::InvalidCredential => "Failed to log in. Check your email and password.".to_string(),
            _ => format!("Failed to create an account. {}", self.message),
        }
    }
}
