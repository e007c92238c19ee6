use super::message::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const TITLE_CHARS: usize = 40;
pub const UNTITLED: &str = "New Chat";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatId::Number(id) => write!(f, "{id}"),
            ChatId::Text(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: ChatId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(alias = "created_at", default = "Utc::now", with = "stamp")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "updated_at", default = "Utc::now", with = "stamp")]
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    pub fn new(id: ChatId, messages: Vec<Message>, at: DateTime<Utc>) -> Self {
        Chat {
            id,
            title: title_for(&messages),
            messages,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn ensure_title(&mut self) {
        if self.title.trim().is_empty() {
            self.title = title_for(&self.messages);
        }
    }
}

pub fn title_for(messages: &[Message]) -> String {
    let title: String = messages
        .first()
        .map(|message| message.content.chars().take(TITLE_CHARS).collect())
        .unwrap_or_default();
    if title.is_empty() {
        UNTITLED.to_string()
    } else {
        title
    }
}

/// Backend timestamps come as epoch milliseconds or ISO-8601 text, with or without an offset.
pub(crate) mod stamp {
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        Text(String),
    }

    pub fn parse(text: &str) -> Option<DateTime<Utc>> {
        if let Ok(at) = DateTime::parse_from_rfc3339(text) {
            return Some(at.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
            .map(|naive| Utc.from_utc_datetime(&naive))
    }

    pub fn serialize<S>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&at.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Raw::deserialize(deserializer)? {
            Raw::Millis(ms) => Utc
                .timestamp_millis_opt(ms)
                .single()
                .ok_or_else(|| de::Error::custom(format!("timestamp {ms} out of range"))),
            Raw::Text(text) => {
                parse(&text).ok_or_else(|| de::Error::custom(format!("invalid timestamp {text:?}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn chat_ids_keep_their_shape() {
        let number: ChatId = serde_json::from_str("42").unwrap();
        let text: ChatId = serde_json::from_str(r#""c-9f""#).unwrap();
        assert_eq!(number, ChatId::Number(42));
        assert_eq!(text, ChatId::Text("c-9f".to_string()));
        assert_eq!(format!("/chats/{number}"), "/chats/42");
        assert_eq!(format!("/chats/{text}"), "/chats/c-9f");
    }

    #[test]
    fn timestamps() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 20, 8, 30, 0).unwrap();
        let chats: Vec<Chat> = serde_json::from_value(serde_json::json!([
            {"id": 1, "title": "a", "messages": [], "createdAt": 1716193800000i64, "updatedAt": "2024-05-20T08:30:00Z"},
            {"id": 2, "title": "b", "messages": [], "created_at": "2024-05-20T08:30:00", "updated_at": "2024-05-20 08:30:00.000"},
        ]))
        .unwrap();
        for chat in &chats {
            assert_eq!(chat.created_at, expected);
            assert_eq!(chat.updated_at, expected);
        }
        let json = serde_json::to_value(&chats[0]).unwrap();
        assert_eq!(json["updatedAt"], "2024-05-20T08:30:00+00:00");
    }

    #[test]
    fn titles() {
        assert_eq!(title_for(&[]), UNTITLED);
        assert_eq!(title_for(&[Message::user("")]), UNTITLED);
        let long = "Saida maka istória Timor-Leste nian iha sékulu rua-nulu?";
        let title = title_for(&[Message::user(long), Message::assistant("...", false)]);
        assert_eq!(title.chars().count(), TITLE_CHARS);
        assert!(long.starts_with(&title));

        let mut chat: Chat = serde_json::from_value(serde_json::json!({
            "id": "x",
            "messages": [{"role": "user", "content": "Bondia"}]
        }))
        .unwrap();
        chat.ensure_title();
        assert_eq!(chat.title, "Bondia");
    }
}
