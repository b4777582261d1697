use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::{
    endpoints::{Endpoint, EndpointKind, generation::GenerationOptions},
    error::{Result, TextSynthError},
    validation::{Validate, require_non_empty},
};

use super::Chat;

/// The author of a chat turn.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        })
    }
}

/// A single role-tagged turn of a chat conversation.
///
/// # Fields
/// * `role` - Who wrote the turn
/// * `content` - The text of the turn
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Creates a new chat message.
    ///
    /// # Arguments
    /// * `role` - The role of the message sender
    /// * `content` - The text of the message
    pub fn new<S: Into<String>>(role: Role, content: S) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates a system prompt. Only allowed as the first turn.
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::new(Role::System, content)
    }

    /// Creates a user message.
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Body of a `chat` request.
///
/// The conversation is sent as an optional `system` prompt plus a list of
/// strings alternating between the user and the assistant, starting and
/// ending with the user.
#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    pub turns: &'a [ChatMessage],
    pub options: &'a GenerationOptions,
    pub stream: bool,
}

impl<'a> ChatRequest<'a> {
    pub fn new(turns: &'a [ChatMessage], options: &'a GenerationOptions) -> Self {
        Self {
            turns,
            options,
            stream: false,
        }
    }

    pub fn streaming(mut self) -> Self {
        self.stream = true;
        self
    }

    fn system(&self) -> Option<&'a str> {
        self.turns
            .first()
            .filter(|turn| turn.role == Role::System)
            .map(|turn| turn.content.as_str())
    }

    fn conversation(&self) -> &'a [ChatMessage] {
        match self.turns.first() {
            Some(turn) if turn.role == Role::System => &self.turns[1..],
            _ => self.turns,
        }
    }
}

#[derive(Serialize)]
struct ChatWire<'a> {
    messages: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(flatten)]
    options: &'a GenerationOptions,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

impl Serialize for ChatRequest<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        ChatWire {
            messages: self
                .conversation()
                .iter()
                .map(|turn| turn.content.as_str())
                .collect(),
            system: self.system(),
            options: self.options,
            stream: self.stream,
        }
        .serialize(serializer)
    }
}

impl Validate for ChatRequest<'_> {
    fn validate(&self) -> Result<()> {
        let conversation = self.conversation();
        if conversation.is_empty() {
            return Err(TextSynthError::invalid(
                "messages",
                "must contain at least one user message",
            ));
        }
        for (index, turn) in conversation.iter().enumerate() {
            let expected = if index % 2 == 0 {
                Role::User
            } else {
                Role::Assistant
            };
            if turn.role != expected {
                return Err(TextSynthError::invalid(
                    "messages",
                    format!("turn {index} is a {} message, expected {expected}", turn.role),
                ));
            }
            require_non_empty("messages", &turn.content)?;
        }
        if conversation.len() % 2 == 0 {
            return Err(TextSynthError::invalid(
                "messages",
                "the last message must come from the user",
            ));
        }
        self.options.validate()
    }
}

impl Endpoint for ChatRequest<'_> {
    type Response = Chat;
    const KIND: EndpointKind = EndpointKind::Chat;
}
