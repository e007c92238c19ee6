use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub streaming: bool,
    /// Backend identifier, known once the chat has been saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
            streaming: false,
            id: None,
        }
    }

    pub fn assistant(content: impl Into<String>, streaming: bool) -> Self {
        Message {
            role: Role::Assistant,
            content: content.into(),
            streaming,
            id: None,
        }
    }

    /// An assistant reply that is in flight but has not received any text yet.
    pub fn is_pending(&self) -> bool {
        self.role == Role::Assistant && self.streaming && self.content.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape() {
        let message: Message =
            serde_json::from_str(r#"{"role":"assistant","content":"Bondia","id":12}"#).unwrap();
        assert_eq!(message.role, Role::Assistant);
        assert!(!message.streaming);
        assert_eq!(message.id, Some(12));

        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"role": "user", "content": "hi", "streaming": false})
        );
    }

    #[test]
    fn pending() {
        assert!(Message::assistant("", true).is_pending());
        assert!(Message::assistant(" \n", true).is_pending());
        assert!(!Message::assistant("Ola", true).is_pending());
        assert!(!Message::assistant("", false).is_pending());
        assert!(!Message::user("").is_pending());
    }
}
