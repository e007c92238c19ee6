use super::{check, Client};
use crate::entities::chat::{Chat, ChatId};
use crate::entities::message::Message;
use crate::Error;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Serialize)]
struct SaveChat<'a> {
    user_id: i64,
    chat_id: Option<&'a ChatId>,
    messages: &'a [Message],
}

/// Save response. `messages` is only present when the backend echoes the
/// stored list back, ids included.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SavedChat {
    pub chat_id: ChatId,
    #[serde(with = "crate::entities::chat::stamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Option<Vec<Message>>,
}

#[derive(Deserialize)]
struct ChatList {
    #[serde(default)]
    chats: Vec<Chat>,
}

impl Client {
    pub async fn save_chat(
        &self,
        user_id: i64,
        chat_id: Option<&ChatId>,
        messages: &[Message],
    ) -> Result<SavedChat, Error> {
        let url = self.url("/chats/save")?;
        let res = self
            .http
            .post(url)
            .json(&SaveChat {
                user_id,
                chat_id,
                messages,
            })
            .send()
            .await?;
        let saved: SavedChat = check(res, "Failed to save chat").await?.json().await?;
        debug!(chat = %saved.chat_id, "Saved {} messages", messages.len());
        Ok(saved)
    }

    pub async fn list_chats(&self, user_id: i64) -> Result<Vec<Chat>, Error> {
        let mut url = self.url("/chats")?;
        url.query_pairs_mut()
            .append_pair("user_id", &user_id.to_string());
        let res = self.http.get(url).send().await?;
        let list: ChatList = check(res, "Failed to load chats").await?.json().await?;
        let mut chats = list.chats;
        for chat in &mut chats {
            chat.ensure_title();
        }
        info!("Loaded {} chats", chats.len());
        Ok(chats)
    }

    /// Deleting a chat the backend no longer has is not an error.
    pub async fn delete_chat(&self, user_id: i64, id: &ChatId) -> Result<(), Error> {
        let mut url = self.url(&format!("/chats/{id}"))?;
        url.query_pairs_mut()
            .append_pair("user_id", &user_id.to_string());
        let res = self.http.delete(url).send().await?;
        if res.status() == StatusCode::NOT_FOUND {
            debug!(chat = %id, "Chat was already deleted");
            return Ok(());
        }
        check(res, "Failed to delete chat").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> Client {
        Client::new(Config {
            api_base: server.uri(),
            ..Config::default()
        })
    }

    #[tokio::test]
    async fn save_sends_current_chat() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chats/save"))
            .and(body_json(serde_json::json!({
                "user_id": 7,
                "chat_id": null,
                "messages": [
                    {"role": "user", "content": "hi", "streaming": false},
                    {"role": "assistant", "content": "Hello", "streaming": false}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "chat_id": 12,
                "updated_at": "2024-05-01T10:00:00"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let messages = [Message::user("hi"), Message::assistant("Hello", false)];
        let saved = client(&server).save_chat(7, None, &messages).await.unwrap();
        assert_eq!(saved.chat_id, ChatId::Number(12));
        assert_eq!(saved.updated_at.to_rfc3339(), "2024-05-01T10:00:00+00:00");
        assert_eq!(saved.messages, None);
    }

    #[tokio::test]
    async fn list_fills_missing_titles() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/chats"))
            .and(query_param("user_id", "7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "chats": [
                    {
                        "id": "a1",
                        "title": "",
                        "messages": [{"role": "user", "content": "Saida mak Timor-Leste nia kapitál?"}],
                        "created_at": 1714557600000i64,
                        "updated_at": "2024-05-01T10:00:00Z"
                    },
                    {"id": 3, "title": "Kuda", "messages": []}
                ]
            })))
            .mount(&server)
            .await;

        let chats = client(&server).list_chats(7).await.unwrap();
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].id, ChatId::Text("a1".to_string()));
        assert_eq!(chats[0].title, "Saida mak Timor-Leste nia kapitál?");
        assert_eq!(chats[1].title, "Kuda");
    }

    #[tokio::test]
    async fn delete_tolerates_missing_chat() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/chats/3"))
            .and(query_param("user_id", "7"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/chats/4"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client(&server);
        client.delete_chat(7, &ChatId::Number(3)).await.unwrap();
        let err = client.delete_chat(7, &ChatId::Number(4)).await.err().unwrap();
        assert_eq!(err.user_message(), "Failed to delete chat");
    }
}
