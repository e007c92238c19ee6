use crate::attachment::Attachment;
use crate::commands::api::ByteStream;
use crate::commands::chats::SavedChat;
use crate::config::Config;
use crate::entities::chat::{Chat, ChatId};
use crate::entities::message::Message;
use crate::history::ChatHistory;
use crate::store::MessageStore;
use crate::stream::{Outcome, StopHandle, StreamSession};
use crate::Error;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// Everything the backend needs to produce one reply.
#[derive(Debug, Clone)]
pub struct StreamRequest {
    /// History up to and including the new user message.
    pub messages: Vec<Message>,
    pub input_text: String,
    pub attachment: Option<Attachment>,
    pub force_search: bool,
}

#[allow(async_fn_in_trait)]
pub trait ChatBackend {
    async fn open_stream(&self, request: &StreamRequest) -> Result<ByteStream, Error>;

    async fn save_chat(
        &self,
        user_id: i64,
        chat_id: Option<&ChatId>,
        messages: &[Message],
    ) -> Result<SavedChat, Error>;
}

#[derive(Debug)]
pub struct Turn {
    pub outcome: Outcome,
    /// Id the chat was saved under, `None` if the reply failed or the save did.
    pub saved: Option<ChatId>,
}

/// The open chat of a logged-in user plus their chat history.
#[derive(Debug)]
pub struct Conversation {
    user_id: i64,
    chat_id: Option<ChatId>,
    store: MessageStore,
    history: ChatHistory,
    max_upload_bytes: u64,
    reveal: Option<Duration>,
    force_search: bool,
}

impl Conversation {
    pub fn new(user_id: i64, config: &Config) -> Self {
        Conversation {
            user_id,
            chat_id: None,
            store: MessageStore::default(),
            history: ChatHistory::default(),
            max_upload_bytes: config.max_upload_bytes,
            reveal: config.reveal_delay(),
            force_search: config.force_search,
        }
    }

    pub fn with_history(mut self, chats: Vec<Chat>) -> Self {
        self.history = ChatHistory::new(chats);
        self
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn chat_id(&self) -> Option<&ChatId> {
        self.chat_id.as_ref()
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub fn messages(&self) -> Vec<Message> {
        self.store.messages()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Message>> {
        self.store.subscribe()
    }

    pub fn is_streaming(&self) -> bool {
        self.store.streaming_slot().is_some()
    }

    pub fn set_force_search(&mut self, force_search: bool) {
        self.force_search = force_search;
    }

    /// Opens a chat from the history. Returns `false` if it is unknown.
    pub fn load_chat(&mut self, id: &ChatId) -> bool {
        let Some(chat) = self.history.get(id) else {
            return false;
        };
        let messages = chat.messages.clone();
        self.store.reset(messages);
        self.chat_id = Some(id.clone());
        true
    }

    pub fn start_new_chat(&mut self) {
        self.store.reset(Vec::new());
        self.chat_id = None;
    }

    /// Drops a chat the backend has deleted. Closes it if it was open.
    pub fn forget_chat(&mut self, id: &ChatId) {
        self.history.remove(id);
        if self.chat_id.as_ref() == Some(id) {
            self.start_new_chat();
        }
    }

    /// Sends `text` and streams the reply into the open chat, then saves it.
    ///
    /// Input errors are returned before anything changes. Once the user
    /// message is in the list, the result is always a [`Turn`]: a failed reply
    /// shows up as [`Outcome::Failed`] and a failed save as `saved: None`.
    pub async fn send<B: ChatBackend>(
        &mut self,
        backend: &B,
        text: &str,
        attachment: Option<Attachment>,
        stop: StopHandle,
    ) -> Result<Turn, Error> {
        if text.trim().is_empty() {
            return Err(Error::EmptyInput);
        }
        if self.is_streaming() {
            return Err(Error::Busy);
        }
        if let Some(attachment) = &attachment {
            attachment.check(self.max_upload_bytes)?;
        }

        self.store.push(Message::user(text));
        let request = StreamRequest {
            messages: self.store.messages(),
            input_text: text.to_string(),
            attachment,
            force_search: self.force_search,
        };
        let session = StreamSession::start(&mut self.store, self.reveal, stop);
        let outcome = session
            .run(&mut self.store, backend.open_stream(&request))
            .await;

        let saved = if outcome.keeps_reply() {
            self.save(backend).await
        } else {
            None
        };
        Ok(Turn { outcome, saved })
    }

    async fn save<B: ChatBackend>(&mut self, backend: &B) -> Option<ChatId> {
        let messages = self.store.messages();
        let saved = match backend
            .save_chat(self.user_id, self.chat_id.as_ref(), &messages)
            .await
        {
            Ok(saved) => saved,
            Err(err) => {
                warn!("Failed to save chat: {err}");
                return None;
            }
        };

        let stored = saved.messages.clone();
        let id = self.history.record_save(
            self.chat_id.as_ref(),
            &saved,
            stored.as_deref().unwrap_or(&messages),
        );
        if let Some(stored) = stored {
            self.store.reset(stored);
        }
        info!(chat = %id, "Saved chat with {} messages", messages.len());
        self.chat_id = Some(id.clone());
        Some(id)
    }
}
