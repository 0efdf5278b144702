//! UI-agnostic message types
//!
//! Shared between the conversation log, the gateway's history mapping and
//! any front end that renders a chat.

use serde::{Deserialize, Serialize};

/// The sender of a chat message. Serialized with the provider's role names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// A chat message in the tutor conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    /// Set on model replies produced with deep-thinking enabled
    #[serde(default)]
    pub is_thinking: bool,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            is_thinking: false,
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
            is_thinking: false,
        }
    }

    /// Empty model message filled in while a reply streams
    pub fn placeholder(is_thinking: bool) -> Self {
        Self {
            role: Role::Model,
            text: String::new(),
            is_thinking,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.role == Role::Model && self.text.is_empty()
    }
}

/// One prior message as forwarded to the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

impl From<&Message> for ChatTurn {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            text: message.text.clone(),
        }
    }
}
