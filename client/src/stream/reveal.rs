use std::time::Duration;

/// Paces how fast accumulated text becomes visible, one character per step.
///
/// Each call to [`Typewriter::next`] waits `delay` and yields a prefix one
/// character longer than the last. The sequence is finite and cannot be
/// restarted. Dropping a pending `next` future (on cancellation) leaves no
/// timer behind and does not advance the position.
#[derive(Debug)]
pub struct Typewriter {
    text: String,
    shown: usize,
    delay: Duration,
}

impl Typewriter {
    /// `shown` is the byte length already visible, usually the previous prefix.
    pub fn new(text: String, shown: usize, delay: Duration) -> Self {
        let shown = if text.is_char_boundary(shown) { shown } else { 0 };
        Typewriter { text, shown, delay }
    }

    pub async fn next(&mut self) -> Option<String> {
        let ch = self.text[self.shown..].chars().next()?;
        tokio::time::sleep(self.delay).await;
        self.shown += ch.len_utf8();
        Some(self.text[..self.shown].to_string())
    }

    pub fn remaining(&self) -> usize {
        self.text[self.shown..].chars().count()
    }
}
