//! Server-sent event pipeline for assistant replies: bytes are decoded and split
//! into events, event payloads are folded into the reply, and the reply is
//! published into a [`MessageStore`](crate::store::MessageStore) until the
//! stream ends, fails or is stopped.

pub mod accumulator;
pub mod cancel;
pub mod decode;
pub mod event;
pub mod reveal;
pub mod session;

pub use accumulator::{Accumulator, Step};
pub use cancel::StopHandle;
pub use decode::{EventSplitter, Utf8Decoder};
pub use event::Event;
pub use reveal::Typewriter;
pub use session::{Outcome, SessionState, StreamSession};
