pub mod attachment;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod entities;
mod error;
pub mod history;
#[cfg(not(target_arch = "wasm32"))]
pub mod logging;
pub mod status;
pub mod store;
pub mod stream;
pub mod suggestions;

pub use attachment::Attachment;
pub use commands::Client;
pub use config::Config;
pub use conversation::{ChatBackend, Conversation, StreamRequest, Turn};
pub use error::Error;
pub use status::StatusPhase;
pub use stream::{Outcome, SessionState, StopHandle};
