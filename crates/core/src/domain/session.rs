use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys the conversation components share inside a session's mappings.
pub mod keys {
    /// `collected_info` entry holding the finished quote request payload.
    pub const PAYLOAD: &str = "payload";
    /// `collected_info` entry holding fields gathered so far.
    pub const DRAFT: &str = "draft";
    /// `conversation_context` entry holding the premiums shown to the user.
    pub const OFFICIAL_PREMIUMS: &str = "official_premiums";
    pub const SELECTED_PLAN: &str = "selected_plan";
    pub const SELECTED_PREMIUM: &str = "selected_premium";
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

pub type CollectedInfo = Map<String, Value>;
pub type ConversationContext = Map<String, Value>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user_message: String,
    pub agent_response: String,
    pub recorded_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(user_message: impl Into<String>, agent_response: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            agent_response: agent_response.into(),
            recorded_at: Utc::now(),
        }
    }
}
