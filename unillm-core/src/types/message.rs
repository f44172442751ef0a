//! Message types for conversation history

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The role of a message in a conversation
///
/// Deserialization goes through [`FromStr`], so an unknown role name fails
/// with the same [`Error::InvalidRole`] message as [`Message::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Role {
    /// System message (instructions)
    System,
    /// User message
    User,
    /// Assistant message
    Assistant,
}

impl Role {
    /// The wire name of the role
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(Error::InvalidRole {
                role: other.to_string(),
                allowed: "user, assistant or system",
            }),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender
    pub role: Role,
    /// The text content of the message
    pub content: String,
}

impl Message {
    /// Create a message with an explicit role
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a message from an untyped role name
    ///
    /// Fails with [`Error::InvalidRole`] when the role is not one of
    /// `user`, `assistant` or `system`.
    pub fn parse(role: &str, content: impl Into<String>) -> Result<Self, Error> {
        Ok(Self::new(role.parse()?, content))
    }

    /// Create a system message
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }

    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Create an assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!("assistant".parse::<Role>().unwrap(), Role::Assistant);
        assert_eq!("system".parse::<Role>().unwrap(), Role::System);

        match "tool".parse::<Role>() {
            Err(Error::InvalidRole { role, .. }) => assert_eq!(role, "tool"),
            other => panic!("Expected InvalidRole, got {other:?}"),
        }
    }

    #[test]
    fn test_role_is_case_sensitive() {
        assert!("User".parse::<Role>().is_err());
    }

    #[test]
    fn test_message_parse() {
        let msg = Message::parse("assistant", "hi").unwrap();
        assert_eq!(msg, Message::assistant("hi"));
        assert!(Message::parse("function", "x").is_err());
    }

    #[test]
    fn test_message_serde_shape() {
        let json = serde_json::to_value(Message::user("Hello")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "Hello"}));

        let msg: Message =
            serde_json::from_value(serde_json::json!({"role": "system", "content": "Be brief"}))
                .unwrap();
        assert_eq!(msg.role, Role::System);
    }

    #[test]
    fn test_unknown_role_fails_deserialization_as_invalid_role() {
        let err = serde_json::from_value::<Message>(serde_json::json!({
            "role": "tool",
            "content": "output"
        }))
        .unwrap_err();
        assert!(
            err.to_string()
                .starts_with("Invalid role tool, role must be user, assistant or system"),
            "{err}"
        );
    }
}
