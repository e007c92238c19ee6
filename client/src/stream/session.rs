use super::accumulator::{Accumulator, Step};
use super::cancel::StopHandle;
use super::decode::{EventSplitter, Utf8Decoder};
use super::event::Event;
use super::reveal::Typewriter;
use crate::store::{MessageStore, Slot};
use crate::Error;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Sent,
    Streaming,
    Completed,
    Cancelled,
    Failed,
}

#[derive(Debug)]
pub enum Outcome {
    Completed(String),
    /// Stopped by the user; holds the partial reply that was kept.
    Cancelled(String),
    /// The reply was removed from the list.
    Failed(Error),
}

impl Outcome {
    pub fn state(&self) -> SessionState {
        match self {
            Outcome::Completed(_) => SessionState::Completed,
            Outcome::Cancelled(_) => SessionState::Cancelled,
            Outcome::Failed(_) => SessionState::Failed,
        }
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            Outcome::Completed(content) | Outcome::Cancelled(content) => Some(content),
            Outcome::Failed(_) => None,
        }
    }

    /// Completed and cancelled replies stay in the chat and get saved.
    pub fn keeps_reply(&self) -> bool {
        !matches!(self, Outcome::Failed(_))
    }
}

enum Flow {
    Finished,
    Stopped,
}

/// One request/stream/response cycle feeding a single assistant message.
pub struct StreamSession {
    slot: Slot,
    state: SessionState,
    utf8: Utf8Decoder,
    splitter: EventSplitter,
    accumulator: Accumulator,
    reveal: Option<Duration>,
    shown: usize,
    stop: StopHandle,
}

impl StreamSession {
    /// Appends the placeholder reply. With `reveal` set, fragments appear one
    /// character per delay instead of all at once.
    pub fn start(store: &mut MessageStore, reveal: Option<Duration>, stop: StopHandle) -> Self {
        let slot = store.open_reply();
        StreamSession {
            slot,
            state: SessionState::Idle,
            utf8: Utf8Decoder::new(),
            splitter: EventSplitter::new(),
            accumulator: Accumulator::new(),
            reveal,
            shown: 0,
            stop,
        }
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drives the session to its end. `open` sends the request and resolves to
    /// the response body; it is not polled at all if the session was stopped
    /// before starting. The body is dropped, aborting the request, as soon as
    /// the session ends.
    pub async fn run<F, S>(mut self, store: &mut MessageStore, open: F) -> Outcome
    where
        F: Future<Output = Result<S, Error>>,
        S: Stream<Item = Result<Bytes, Error>> + Unpin,
    {
        self.transition(SessionState::Sent);
        let opened = tokio::select! {
            biased;
            _ = self.stop.stopped() => None,
            opened = open => Some(opened),
        };
        let stream = match opened {
            None => return self.cancel(store),
            Some(Err(err)) => return self.fail(store, err),
            Some(Ok(stream)) => stream,
        };

        self.transition(SessionState::Streaming);
        match self.pump(store, stream).await {
            Ok(Flow::Finished) => self.complete(store),
            Ok(Flow::Stopped) => self.cancel(store),
            Err(err) => self.fail(store, err),
        }
    }

    async fn pump<S>(&mut self, store: &mut MessageStore, mut stream: S) -> Result<Flow, Error>
    where
        S: Stream<Item = Result<Bytes, Error>> + Unpin,
    {
        loop {
            let chunk = tokio::select! {
                biased;
                _ = self.stop.stopped() => return Ok(Flow::Stopped),
                chunk = stream.next() => chunk,
            };
            let Some(chunk) = chunk else {
                if self.utf8.finish().is_some() || !self.splitter.pending().is_empty() {
                    debug!(
                        "Stream closed with an unterminated event: {:?}",
                        self.splitter.pending()
                    );
                }
                return Ok(Flow::Finished);
            };

            let text = self.utf8.decode(&chunk?);
            for block in self.splitter.feed(&text) {
                if self.stop.is_stopped() {
                    return Ok(Flow::Stopped);
                }
                let event = Event::parse(&block);
                match self.accumulator.apply(&event) {
                    Step::End => return Ok(Flow::Finished),
                    Step::Append(_) => {
                        if !self.reveal(store).await {
                            return Ok(Flow::Stopped);
                        }
                    }
                    Step::Skip => debug!(kind = ?event.kind, "Skipped event without content"),
                }
            }
        }
    }

    /// Publishes the accumulated content. Returns `false` if stopped midway.
    ///
    /// Runs between reads, so the body is not polled while characters are
    /// revealed. The pause is bounded by the new text's length times the reveal
    /// delay, and a stop ends it at the next character.
    async fn reveal(&mut self, store: &mut MessageStore) -> bool {
        let content = self.accumulator.content().to_string();
        let Some(delay) = self.reveal else {
            self.shown = content.len();
            store.stream_into(self.slot, content);
            return true;
        };

        let mut typewriter = Typewriter::new(content, self.shown, delay);
        loop {
            let prefix = tokio::select! {
                biased;
                _ = self.stop.stopped() => return false,
                prefix = typewriter.next() => prefix,
            };
            match prefix {
                Some(prefix) => {
                    self.shown = prefix.len();
                    store.stream_into(self.slot, prefix);
                }
                None => return true,
            }
        }
    }

    fn complete(mut self, store: &mut MessageStore) -> Outcome {
        self.transition(SessionState::Completed);
        let content = self.accumulator.into_content();
        info!(chars = content.chars().count(), "Reply completed");
        store.finish(self.slot, content.clone());
        Outcome::Completed(content)
    }

    fn cancel(mut self, store: &mut MessageStore) -> Outcome {
        self.transition(SessionState::Cancelled);
        let content = self.accumulator.into_content();
        info!(chars = content.chars().count(), "Reply stopped by user");
        store.finish(self.slot, content.clone());
        Outcome::Cancelled(content)
    }

    fn fail(mut self, store: &mut MessageStore, err: Error) -> Outcome {
        self.transition(SessionState::Failed);
        error!("Reply failed: {err}");
        store.discard(self.slot);
        Outcome::Failed(err)
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, "Session state");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::message::Message;
    use futures::channel::mpsc;
    use futures::stream;
    use pretty_assertions::assert_eq;
    use std::future::{pending, ready};

    type Chunks = stream::Iter<std::vec::IntoIter<Result<Bytes, Error>>>;

    fn chunks(parts: &[&str]) -> Chunks {
        let parts: Vec<Result<Bytes, Error>> = parts
            .iter()
            .map(|part| Ok(Bytes::copy_from_slice(part.as_bytes())))
            .collect();
        stream::iter(parts)
    }

    fn history() -> MessageStore {
        MessageStore::new(vec![Message::user("hi")])
    }

    async fn run(store: &mut MessageStore, parts: &[&str]) -> Outcome {
        let session = StreamSession::start(store, None, StopHandle::new());
        assert_eq!(session.state(), SessionState::Idle);
        session.run(store, ready(Ok(chunks(parts)))).await
    }

    #[tokio::test]
    async fn end_event_completes() {
        let mut store = history();
        let outcome = run(
            &mut store,
            &["data: He\n\ndata: llo\n\nevent: end\ndata: \n\ndata: ignored\n\n"],
        )
        .await;
        assert_eq!(outcome.content(), Some("Hello"));
        assert_eq!(outcome.state(), SessionState::Completed);
        assert_eq!(
            store.messages(),
            vec![Message::user("hi"), Message::assistant("Hello", false)]
        );
    }

    #[tokio::test]
    async fn nothing_after_end_is_read() {
        let mut store = history();
        let parts: Vec<Result<Bytes, Error>> = vec![
            Ok(Bytes::from_static(b"data: Ola\n\nevent: end\n\n")),
            Err(Error::Unauthorized("never polled".to_string())),
        ];
        let session = StreamSession::start(&mut store, None, StopHandle::new());
        let outcome = session.run(&mut store, ready(Ok(stream::iter(parts)))).await;
        assert_eq!(outcome.state(), SessionState::Completed);
        assert_eq!(outcome.content(), Some("Ola"));
    }

    #[tokio::test]
    async fn fragments_split_across_reads() {
        let mut store = history();
        let outcome = run(
            &mut store,
            &["data: He\r", "\n\r\nda", "ta: l", "lo\n", "\n", "data: [DO", "NE]\n\n"],
        )
        .await;
        assert_eq!(outcome.content(), Some("Hello"));
    }

    #[tokio::test]
    async fn multibyte_characters_split_across_reads() {
        let mut store = history();
        let body = "data: Di'ak ñ 🌏\n\n".as_bytes();
        let parts: Vec<Result<Bytes, Error>> = body
            .chunks(3)
            .map(|part| Ok(Bytes::copy_from_slice(part)))
            .collect();
        let session = StreamSession::start(&mut store, None, StopHandle::new());
        let outcome = session.run(&mut store, ready(Ok(stream::iter(parts)))).await;
        assert_eq!(outcome.content(), Some("Di'ak ñ 🌏"));
    }

    #[tokio::test]
    async fn done_sentinel_alone_does_not_terminate() {
        // Only `event: end` ends a stream; `[DONE]` is filtered content.
        let mut store = history();
        let outcome = run(&mut store, &["data: [DONE]\n\n", "data: late\n\n"]).await;
        assert_eq!(outcome.content(), Some("late"));

        // Closing the body without `end` completes with what arrived.
        let mut store = history();
        let outcome = run(&mut store, &["data: [DONE]\n\n"]).await;
        assert_eq!(outcome.state(), SessionState::Completed);
        assert_eq!(store.messages()[1], Message::assistant("", false));
    }

    #[tokio::test]
    async fn heartbeats_and_unknown_fields_are_ignored() {
        let mut store = history();
        let outcome = run(
            &mut store,
            &["\n\n: keep-alive\n\nretry: 10\n\nid: 1\ndata: ok\n\nevent: end\n\n"],
        )
        .await;
        assert_eq!(outcome.content(), Some("ok"));
    }

    #[tokio::test]
    async fn failed_request_restores_the_list() {
        let mut store = history();
        let before = store.messages();
        let session = StreamSession::start(&mut store, None, StopHandle::new());
        let open = ready(Err::<Chunks, _>(Error::Api {
            status: 502,
            detail: "Bad gateway".to_string(),
        }));
        let outcome = session.run(&mut store, open).await;
        assert!(matches!(outcome, Outcome::Failed(Error::Api { status: 502, .. })));
        assert!(!outcome.keeps_reply());
        assert_eq!(store.messages(), before);
    }

    #[tokio::test]
    async fn read_error_discards_partial_reply() {
        let mut store = history();
        let before = store.messages();
        let parts: Vec<Result<Bytes, Error>> = vec![
            Ok(Bytes::from_static(b"data: partial\n\n")),
            Err(Error::Io(std::io::Error::other("connection reset"))),
        ];
        let session = StreamSession::start(&mut store, None, StopHandle::new());
        let outcome = session.run(&mut store, ready(Ok(stream::iter(parts)))).await;
        assert_eq!(outcome.state(), SessionState::Failed);
        assert_eq!(store.messages(), before);
    }

    #[tokio::test]
    async fn stop_keeps_partial_content() {
        let mut store = history();
        let mut rx = store.subscribe();
        let stop = StopHandle::new();
        let (tx, body) = mpsc::unbounded::<Result<Bytes, Error>>();
        let session = StreamSession::start(&mut store, None, stop.clone());

        let user = async {
            tx.unbounded_send(Ok(Bytes::from_static(b"data: Hello\n\ndata:  wor\n\n")))
                .unwrap();
            rx.wait_for(|messages| messages[1].content == "Hello wor")
                .await
                .unwrap();
            stop.stop();
        };
        let (outcome, ()) = tokio::join!(session.run(&mut store, ready(Ok(body))), user);

        assert_eq!(outcome.state(), SessionState::Cancelled);
        assert_eq!(outcome.content(), Some("Hello wor"));
        assert_eq!(store.messages()[1], Message::assistant("Hello wor", false));
        // Stopping again after the session ended changes nothing.
        stop.stop();
        assert_eq!(store.messages()[1], Message::assistant("Hello wor", false));
    }

    #[tokio::test]
    async fn stop_before_response_keeps_empty_reply() {
        let mut store = history();
        let stop = StopHandle::new();
        stop.stop();
        let session = StreamSession::start(&mut store, None, stop);
        let outcome = session.run(&mut store, pending::<Result<Chunks, Error>>()).await;
        assert_eq!(outcome.state(), SessionState::Cancelled);
        assert_eq!(
            store.messages(),
            vec![Message::user("hi"), Message::assistant("", false)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn typewriter_paces_the_reply() {
        let mut store = history();
        let start = tokio::time::Instant::now();
        let session = StreamSession::start(
            &mut store,
            Some(Duration::from_millis(10)),
            StopHandle::new(),
        );
        let outcome = session
            .run(&mut store, ready(Ok(chunks(&["data: Hi\n\ndata: !\n\nevent: end\n\n"]))))
            .await;
        assert_eq!(outcome.content(), Some("Hi!"));
        assert_eq!(start.elapsed(), Duration::from_millis(30));
    }

    #[tokio::test(start_paused = true)]
    async fn body_is_read_after_each_reveal() {
        let mut store = history();
        let start = tokio::time::Instant::now();
        let reads = std::cell::RefCell::new(vec![]);
        let body = chunks(&["data: Hi\n\n", "data: !\n\n"])
            .inspect(|_| reads.borrow_mut().push(start.elapsed()));
        let session = StreamSession::start(
            &mut store,
            Some(Duration::from_millis(10)),
            StopHandle::new(),
        );
        let outcome = session.run(&mut store, ready(Ok(body))).await;
        assert_eq!(outcome.content(), Some("Hi!"));
        assert_eq!(
            reads.into_inner(),
            vec![Duration::ZERO, Duration::from_millis(20)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_reveal_keeps_whole_fragment() {
        let mut store = history();
        let rx = store.subscribe();
        let stop = StopHandle::new();
        let (tx, body) = mpsc::unbounded::<Result<Bytes, Error>>();
        tx.unbounded_send(Ok(Bytes::from_static(b"data: Hello\n\n")))
            .unwrap();
        let session =
            StreamSession::start(&mut store, Some(Duration::from_millis(10)), stop.clone());

        let user = async {
            tokio::time::sleep(Duration::from_millis(25)).await;
            assert_eq!(rx.borrow()[1].content, "He");
            stop.stop();
        };
        let (outcome, ()) = tokio::join!(session.run(&mut store, ready(Ok(body))), user);
        drop(tx);

        assert_eq!(outcome.content(), Some("Hello"));
        assert_eq!(store.messages()[1], Message::assistant("Hello", false));
    }
}
