use crate::entities::message::{Message, Role};
use tokio::sync::watch;
use tracing::debug;

/// Local key of a message inside one [`MessageStore`]. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot(u64);

/// Ordered message list of one chat view.
///
/// Every mutation replaces whole `Message` values and publishes a fresh
/// snapshot to subscribers. At most one message is expected to be
/// `streaming`; keeping it that way is the caller's job.
#[derive(Debug)]
pub struct MessageStore {
    entries: Vec<(Slot, Message)>,
    next_slot: u64,
    tx: watch::Sender<Vec<Message>>,
}

impl Default for MessageStore {
    fn default() -> Self {
        MessageStore::new(Vec::new())
    }
}

impl MessageStore {
    pub fn new(messages: Vec<Message>) -> Self {
        let (tx, _rx) = watch::channel(messages.clone());
        let mut store = MessageStore {
            entries: Vec::with_capacity(messages.len()),
            next_slot: 0,
            tx,
        };
        for message in messages {
            let slot = store.allocate();
            store.entries.push((slot, message));
        }
        store
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Message>> {
        self.tx.subscribe()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.entries.iter().map(|(_, message)| message.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, slot: Slot) -> Option<&Message> {
        self.position(slot).map(|i| &self.entries[i].1)
    }

    pub fn streaming_slot(&self) -> Option<Slot> {
        self.entries
            .iter()
            .find(|(_, message)| message.streaming)
            .map(|(slot, _)| *slot)
    }

    pub fn push(&mut self, message: Message) -> Slot {
        let slot = self.allocate();
        self.entries.push((slot, message));
        self.publish();
        slot
    }

    /// Appends the empty assistant reply a stream will fill.
    pub fn open_reply(&mut self) -> Slot {
        self.push(Message::assistant("", true))
    }

    pub fn stream_into(&mut self, slot: Slot, content: String) {
        self.replace(slot, Message::assistant(content, true));
    }

    pub fn finish(&mut self, slot: Slot, content: String) {
        self.replace(slot, Message::assistant(content, false));
    }

    pub fn discard(&mut self, slot: Slot) -> Option<Message> {
        let i = self.position(slot)?;
        let (_, message) = self.entries.remove(i);
        self.publish();
        Some(message)
    }

    /// Replaces the whole list, e.g. when opening a saved chat.
    pub fn reset(&mut self, messages: Vec<Message>) {
        self.entries.clear();
        for message in messages {
            let slot = self.allocate();
            self.entries.push((slot, message));
        }
        self.publish();
    }

    fn replace(&mut self, slot: Slot, message: Message) {
        debug_assert_eq!(message.role, Role::Assistant);
        match self.position(slot) {
            Some(i) => {
                self.entries[i].1 = message;
                self.publish();
            }
            None => debug!("Dropped update for removed slot {slot:?}"),
        }
    }

    fn position(&self, slot: Slot) -> Option<usize> {
        self.entries.iter().position(|(s, _)| *s == slot)
    }

    fn allocate(&mut self) -> Slot {
        let slot = Slot(self.next_slot);
        self.next_slot += 1;
        slot
    }

    fn publish(&self) {
        self.tx.send_replace(self.messages());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_lifecycle() {
        let mut store = MessageStore::new(vec![Message::user("hi")]);
        let rx = store.subscribe();
        let slot = store.open_reply();
        assert_eq!(store.streaming_slot(), Some(slot));
        assert!(store.get(slot).unwrap().is_pending());

        store.stream_into(slot, "He".to_string());
        assert_eq!(rx.borrow()[1], Message::assistant("He", true));

        store.finish(slot, "Hello".to_string());
        assert_eq!(store.streaming_slot(), None);
        assert_eq!(
            *rx.borrow(),
            vec![Message::user("hi"), Message::assistant("Hello", false)]
        );
    }

    #[test]
    fn slots_survive_removals() {
        let mut store = MessageStore::default();
        let first = store.push(Message::user("a"));
        let reply = store.open_reply();
        store.discard(first);
        store.stream_into(reply, "still here".to_string());
        assert_eq!(store.messages(), vec![Message::assistant("still here", true)]);

        store.discard(reply);
        store.stream_into(reply, "late".to_string());
        assert!(store.is_empty());
        assert_eq!(store.discard(reply), None);
    }

    #[test]
    fn reset_publishes() {
        let mut store = MessageStore::new(vec![Message::user("old")]);
        let mut rx = store.subscribe();
        store.reset(vec![Message::user("new"), Message::assistant("ok", false)]);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 2);
        assert_eq!(store.len(), 2);
    }
}
