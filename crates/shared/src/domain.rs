use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reserved preference key holding the first-login flag.
pub const FIRST_LOGIN_KEY: &str = "isFirstLogin";
/// Preference key holding the name entered at registration.
pub const DISPLAY_NAME_KEY: &str = "username";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub email: String,
    pub signed_in_at: DateTime<Utc>,
}

/// Logical states of the first-login flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirstLoginState {
    Pending,
    Consumed,
}

impl FirstLoginState {
    pub fn sentinel(self) -> &'static str {
        match self {
            FirstLoginState::Pending => "true",
            FirstLoginState::Consumed => "false",
        }
    }

    /// Only the exact `"true"` text counts as pending.
    pub fn from_sentinel(text: &str) -> Self {
        if text == "true" {
            FirstLoginState::Pending
        } else {
            FirstLoginState::Consumed
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    Wish,
    Plan,
}
