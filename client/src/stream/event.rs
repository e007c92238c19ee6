pub const END_EVENT: &str = "end";
pub const DONE_SENTINEL: &str = "[DONE]";

const EVENT_PREFIX: &str = "event: ";
const DATA_PREFIX: &str = "data: ";

/// One parsed server-sent event. Fields other than `event` and `data` are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    pub kind: Option<String>,
    pub data: String,
}

impl Event {
    pub fn parse(block: &str) -> Self {
        let mut kind = None;
        let mut data = Vec::new();
        for line in block.lines() {
            if let Some(value) = line.strip_prefix(EVENT_PREFIX) {
                kind = Some(value.trim().to_string());
            } else if let Some(value) = line.strip_prefix(DATA_PREFIX) {
                data.push(value);
            }
        }
        Event {
            kind,
            data: data.join("\n"),
        }
    }

    pub fn is_end(&self) -> bool {
        self.kind.as_deref() == Some(END_EVENT)
    }

    pub fn is_done_sentinel(&self) -> bool {
        self.data == DONE_SENTINEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_line_data() {
        let event = Event::parse("data: a\ndata: b\ndata: c");
        assert_eq!(event.kind, None);
        assert_eq!(event.data, "a\nb\nc");

        let event = Event::parse("data: a\r\ndata: b\r\ndata: c");
        assert_eq!(event.data, "a\nb\nc");
    }

    #[test]
    fn event_type_is_trimmed() {
        let event = Event::parse("event: end  \r\ndata: ");
        assert!(event.is_end());
        assert_eq!(event.data, "");
    }

    #[test]
    fn unknown_fields_ignored() {
        let event = Event::parse("id: 4\nretry: 3000\n: comment\ndata: Bondia");
        assert_eq!(
            event,
            Event {
                kind: None,
                data: "Bondia".to_string()
            }
        );
        assert_eq!(Event::parse(""), Event::default());
        assert_eq!(Event::parse("data:no-space"), Event::default());
    }

    #[test]
    fn leading_spaces_in_data_are_content() {
        assert_eq!(Event::parse("data:  two").data, " two");
        assert!(Event::parse("data: [DONE]").is_done_sentinel());
    }
}
