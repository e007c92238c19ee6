use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// User side of a session's cancel operation. Clones share one token, so the
/// stop button can hold a copy while the session runs. Stopping is idempotent
/// and a no-op once the session has finished.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    token: CancellationToken,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) fn stopped(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }
}
