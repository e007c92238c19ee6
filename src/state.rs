use labadain_client::entities::chat::{Chat, ChatId};
use labadain_client::entities::message::Message;
use labadain_client::entities::user::User;
use labadain_client::{Attachment, Client, Conversation, Error, Outcome, StopHandle};
use leptos::logging::{log, warn};
use leptos::*;

const USER_KEY: &str = "labadain_user";

fn storage() -> Option<web_sys::Storage> {
    window().local_storage().ok().flatten()
}

pub fn load_user() -> Option<User> {
    let raw = storage()?.get_item(USER_KEY).ok()??;
    match serde_json::from_str(&raw) {
        Ok(user) => Some(user),
        Err(err) => {
            warn!("Dropping stored user: {err}");
            clear_user();
            None
        }
    }
}

pub fn save_user(user: &User) {
    let Some(storage) = storage() else { return };
    match serde_json::to_string(user) {
        Ok(raw) => {
            let _ = storage.set_item(USER_KEY, &raw);
        }
        Err(err) => warn!("Could not store user: {err}"),
    }
}

pub fn clear_user() {
    if let Some(storage) = storage() {
        let _ = storage.remove_item(USER_KEY);
    }
}

/// Reactive view of the logged-in user's conversation.
///
/// The [`Conversation`] itself lives outside the reactive graph and is taken
/// out while a reply streams, so chat switching is refused until it is back.
#[derive(Clone, Copy)]
pub struct ChatState {
    conversation: StoredValue<Option<Conversation>>,
    stop: StoredValue<Option<StopHandle>>,
    generation: StoredValue<u64>,
    pub messages: RwSignal<Vec<Message>>,
    pub chats: RwSignal<Vec<Chat>>,
    pub current: RwSignal<Option<ChatId>>,
    pub streaming: RwSignal<bool>,
    pub loading: RwSignal<bool>,
    pub notice: RwSignal<Option<String>>,
}

impl ChatState {
    pub fn new() -> Self {
        ChatState {
            conversation: store_value(None),
            stop: store_value(None),
            generation: store_value(0),
            messages: create_rw_signal(Vec::new()),
            chats: create_rw_signal(Vec::new()),
            current: create_rw_signal(None),
            streaming: create_rw_signal(false),
            loading: create_rw_signal(false),
            notice: create_rw_signal(None),
        }
    }

    /// Loads the user's chats and starts an empty conversation.
    pub fn open(self, client: Client, user_id: i64) {
        self.close();
        let generation = self.generation.get_value();
        self.loading.set(true);
        spawn_local(async move {
            let chats = match client.list_chats(user_id).await {
                Ok(chats) => chats,
                Err(err) => {
                    warn!("Could not load chats: {err}");
                    Vec::new()
                }
            };
            if self.generation.get_value() != generation {
                return;
            }
            let conversation = Conversation::new(user_id, client.config()).with_history(chats);
            self.install(conversation);
            self.loading.set(false);
        });
    }

    /// Forgets everything about the current user.
    pub fn close(self) {
        self.stop();
        self.generation.update_value(|generation| *generation += 1);
        self.conversation.set_value(None);
        self.messages.set(Vec::new());
        self.chats.set(Vec::new());
        self.current.set(None);
        self.streaming.set(false);
        self.loading.set(false);
        self.notice.set(None);
    }

    fn install(self, conversation: Conversation) {
        let mut rx = conversation.subscribe();
        let generation = self.generation.get_value();
        self.messages.set(conversation.messages());
        self.conversation.set_value(Some(conversation));
        self.sync();
        spawn_local(async move {
            while rx.changed().await.is_ok() {
                if self.generation.get_value() != generation {
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                self.messages.set(snapshot);
            }
        });
    }

    fn sync(self) {
        self.conversation.with_value(|conversation| {
            if let Some(conversation) = conversation {
                self.chats.set(conversation.history().chats().to_vec());
                self.current.set(conversation.chat_id().cloned());
            }
        });
    }

    fn with_idle<F>(self, f: F) -> bool
    where
        F: FnOnce(&mut Conversation),
    {
        let mut done = false;
        self.conversation.update_value(|conversation| {
            if let Some(conversation) = conversation {
                f(conversation);
                done = true;
            }
        });
        if done {
            self.sync();
        } else {
            self.notice.set(Some(Error::Busy.to_string()));
        }
        done
    }

    pub fn new_chat(self) {
        self.with_idle(Conversation::start_new_chat);
    }

    pub fn open_chat(self, id: ChatId) {
        self.with_idle(|conversation| {
            if !conversation.load_chat(&id) {
                warn!("Unknown chat {id}");
            }
        });
    }

    pub fn delete_chat(self, client: Client, id: ChatId) {
        let Some(user_id) = self.conversation.with_value(|c| c.as_ref().map(Conversation::user_id)) else {
            self.notice.set(Some(Error::Busy.to_string()));
            return;
        };
        spawn_local(async move {
            match client.delete_chat(user_id, &id).await {
                Ok(()) => {
                    self.with_idle(|conversation| conversation.forget_chat(&id));
                }
                Err(err) => self.notice.set(Some(err.user_message())),
            }
        });
    }

    pub fn send(self, client: Client, text: String, attachment: Option<Attachment>) {
        let mut taken = None;
        self.conversation.update_value(|conversation| taken = conversation.take());
        let Some(mut conversation) = taken else {
            self.notice.set(Some(Error::Busy.to_string()));
            return;
        };
        let stop = StopHandle::new();
        self.stop.set_value(Some(stop.clone()));
        self.streaming.set(true);
        self.notice.set(None);
        let generation = self.generation.get_value();

        spawn_local(async move {
            let result = conversation.send(&client, &text, attachment, stop).await;
            if self.generation.get_value() != generation {
                log!("Dropping reply of a closed session");
                return;
            }
            match result {
                Ok(turn) => {
                    if let Outcome::Failed(err) = &turn.outcome {
                        self.notice.set(Some(err.user_message()));
                    }
                }
                Err(err) => self.notice.set(Some(err.user_message())),
            }
            self.conversation.set_value(Some(conversation));
            self.stop.set_value(None);
            self.streaming.set(false);
            self.sync();
        });
    }

    pub fn stop(self) {
        self.stop.with_value(|stop| {
            if let Some(stop) = stop {
                stop.stop();
            }
        });
    }
}
