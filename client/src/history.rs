use crate::commands::chats::SavedChat;
use crate::entities::chat::{Chat, ChatId};
use crate::entities::message::Message;

/// The user's chats, most recent first.
#[derive(Debug, Clone, Default)]
pub struct ChatHistory {
    chats: Vec<Chat>,
}

impl ChatHistory {
    pub fn new(mut chats: Vec<Chat>) -> Self {
        for chat in &mut chats {
            chat.ensure_title();
        }
        ChatHistory { chats }
    }

    pub fn chats(&self) -> &[Chat] {
        &self.chats
    }

    pub fn get(&self, id: &ChatId) -> Option<&Chat> {
        self.chats.iter().find(|chat| &chat.id == id)
    }

    /// Applies a save response and returns the id the chat now has.
    pub fn record_save(
        &mut self,
        current: Option<&ChatId>,
        saved: &SavedChat,
        messages: &[Message],
    ) -> ChatId {
        let existing = current.and_then(|id| self.chats.iter_mut().find(|chat| &chat.id == id));
        match existing {
            Some(chat) => {
                chat.messages = messages.to_vec();
                chat.updated_at = saved.updated_at;
                chat.id.clone()
            }
            None => {
                let chat = Chat::new(saved.chat_id.clone(), messages.to_vec(), saved.updated_at);
                let id = chat.id.clone();
                self.chats.insert(0, chat);
                id
            }
        }
    }

    pub fn remove(&mut self, id: &ChatId) -> Option<Chat> {
        let i = self.chats.iter().position(|chat| &chat.id == id)?;
        Some(self.chats.remove(i))
    }
}
