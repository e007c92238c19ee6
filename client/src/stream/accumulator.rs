use super::event::Event;

#[derive(Debug, PartialEq, Eq)]
pub enum Step<'a> {
    /// A fragment was appended to the content.
    Append(&'a str),
    /// `event: end` arrived; nothing after it counts.
    End,
    Skip,
}

/// Folds event payloads into the assistant reply, in arrival order.
#[derive(Debug, Default)]
pub struct Accumulator {
    content: String,
    terminated: bool,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply<'e>(&mut self, event: &'e Event) -> Step<'e> {
        if self.terminated {
            return Step::Skip;
        }
        if event.is_end() {
            self.terminated = true;
            return Step::End;
        }
        // `[DONE]` is only filtered out here; it does not end the stream.
        if event.data.is_empty() || event.is_done_sentinel() {
            return Step::Skip;
        }
        self.content.push_str(&event.data);
        Step::Append(&event.data)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn into_content(self) -> String {
        self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(text: &str) -> Event {
        Event {
            kind: None,
            data: text.to_string(),
        }
    }

    fn end() -> Event {
        Event {
            kind: Some("end".to_string()),
            data: String::new(),
        }
    }

    #[test]
    fn appends_fragments() {
        let mut acc = Accumulator::new();
        assert_eq!(acc.apply(&data("He")), Step::Append("He"));
        assert_eq!(acc.apply(&data("llo")), Step::Append("llo"));
        assert_eq!(acc.content(), "Hello");
    }

    #[test]
    fn done_sentinel_never_lands() {
        let mut acc = Accumulator::new();
        for event in [data("[DONE]"), data("a"), data("[DONE]"), data(""), data("b")] {
            acc.apply(&event);
        }
        assert_eq!(acc.content(), "ab");
        assert!(!acc.is_terminated());
        // A fragment that merely contains the sentinel is content.
        acc.apply(&data(" [DONE] "));
        assert_eq!(acc.content(), "ab [DONE] ");
    }

    #[test]
    fn end_is_final() {
        let mut acc = Accumulator::new();
        acc.apply(&data("Ola"));
        assert_eq!(acc.apply(&end()), Step::End);
        assert_eq!(acc.apply(&data(" lakon")), Step::Skip);
        assert_eq!(acc.apply(&end()), Step::Skip);
        assert!(acc.is_terminated());
        assert_eq!(acc.into_content(), "Ola");
    }

    #[test]
    fn end_event_data_is_ignored() {
        let mut acc = Accumulator::new();
        let event = Event {
            kind: Some("end".to_string()),
            data: "bye".to_string(),
        };
        assert_eq!(acc.apply(&event), Step::End);
        assert_eq!(acc.content(), "");
    }
}
