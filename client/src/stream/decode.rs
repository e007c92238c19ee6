//! Turns raw response bytes into complete event blocks.
//!
//! Network reads split the body anywhere: inside a multi-byte character, inside
//! an event, or between the two halves of a delimiter. Both decoders here keep
//! whatever they could not finish and pick it up on the next chunk.

const LF_DELIMITER: &str = "\n\n";
const CRLF_DELIMITER: &str = "\r\n\r\n";

/// Streaming UTF-8 decoder. An incomplete trailing sequence is kept for the
/// next chunk; invalid sequences become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    leftover: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.leftover);
        bytes.extend_from_slice(chunk);

        let mut text = String::with_capacity(bytes.len());
        let mut rest = &bytes[..];
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            self.leftover = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        text
    }

    /// Flushes a sequence the stream never completed.
    pub fn finish(&mut self) -> Option<char> {
        if self.leftover.is_empty() {
            None
        } else {
            self.leftover.clear();
            Some(char::REPLACEMENT_CHARACTER)
        }
    }
}

/// Splits decoded text into raw event blocks on `\n\n` or `\r\n\r\n`.
#[derive(Debug, Default)]
pub struct EventSplitter {
    buffer: String,
    /// Bytes already searched without finding a delimiter.
    scanned: usize,
}

impl EventSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, text: &str) -> Vec<String> {
        self.buffer.push_str(text);
        let mut blocks = Vec::new();
        loop {
            let from = resume_at(&self.buffer, self.scanned);
            match next_delimiter(&self.buffer[from..]) {
                Some((end, len)) => {
                    let end = from + end;
                    blocks.push(self.buffer[..end].to_string());
                    self.buffer.drain(..end + len);
                    self.scanned = 0;
                }
                None => {
                    self.scanned = self.buffer.len();
                    return blocks;
                }
            }
        }
    }

    /// Text of an event that has not been terminated yet.
    pub fn pending(&self) -> &str {
        &self.buffer
    }
}

/// Where to resume searching. A delimiter completed by new text can start at
/// most three bytes before the end of what was already searched.
fn resume_at(buffer: &str, scanned: usize) -> usize {
    let mut from = scanned.saturating_sub(CRLF_DELIMITER.len() - 1);
    while !buffer.is_char_boundary(from) {
        from -= 1;
    }
    from
}

/// Earliest delimiter as `(index, length)`. `\n\n` wins unless `\r\n\r\n`
/// starts strictly before it.
fn next_delimiter(buffer: &str) -> Option<(usize, usize)> {
    let lf = buffer.find(LF_DELIMITER);
    let crlf = buffer.find(CRLF_DELIMITER);
    match (lf, crlf) {
        (Some(lf), Some(crlf)) if crlf < lf => Some((crlf, CRLF_DELIMITER.len())),
        (Some(lf), _) => Some((lf, LF_DELIMITER.len())),
        (None, Some(crlf)) => Some((crlf, CRLF_DELIMITER.len())),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "data: Ola\n\n\
        data: , di'ak\r\n\r\n\
        : heartbeat\n\n\
        \n\n\
        id: 7\r\ndata: line one\r\ndata: line two\r\n\r\n\
        event: end\ndata: \n\n\
        data: trailing";

    fn split_all(chunks: &[&str]) -> (Vec<String>, String) {
        let mut splitter = EventSplitter::new();
        let mut blocks = vec![];
        for chunk in chunks {
            blocks.extend(splitter.feed(chunk));
        }
        (blocks, splitter.pending().to_string())
    }

    #[test]
    fn splits_on_both_delimiters() {
        let (blocks, pending) = split_all(&[SAMPLE]);
        assert_eq!(
            blocks,
            vec![
                "data: Ola",
                "data: , di'ak",
                ": heartbeat",
                "",
                "id: 7\r\ndata: line one\r\ndata: line two",
                "event: end\ndata: ",
            ]
        );
        assert_eq!(pending, "data: trailing");
    }

    #[test]
    fn crlf_delimiter_splits_once() {
        let (blocks, pending) = split_all(&["data: a\r\n\r\ndata: b\r\n\r\n"]);
        assert_eq!(blocks, vec!["data: a", "data: b"]);
        assert_eq!(pending, "");
    }

    #[test]
    fn lf_wins_when_first() {
        let (blocks, pending) = split_all(&["data: a\n\ndata: b\r\n\r\n"]);
        assert_eq!(blocks, vec!["data: a", "data: b"]);
        assert_eq!(pending, "");
    }

    #[test]
    fn chunk_boundaries_do_not_matter() {
        let whole = split_all(&[SAMPLE]);
        let chars: Vec<(usize, char)> = SAMPLE.char_indices().collect();
        for &(i, _) in &chars {
            assert_eq!(split_all(&[&SAMPLE[..i], &SAMPLE[i..]]), whole, "split at {i}");
            for &(j, _) in chars.iter().filter(|(j, _)| *j >= i) {
                let parts = [&SAMPLE[..i], &SAMPLE[i..j], &SAMPLE[j..]];
                assert_eq!(split_all(&parts), whole, "split at {i} and {j}");
            }
        }
    }

    #[test]
    fn one_byte_reads_resume_scanning() {
        let whole = split_all(&[SAMPLE]);
        let mut splitter = EventSplitter::new();
        let mut blocks = vec![];
        let mut start = 0;
        for (i, _) in SAMPLE.char_indices().skip(1) {
            blocks.extend(splitter.feed(&SAMPLE[start..i]));
            assert_eq!(splitter.scanned, splitter.pending().len());
            start = i;
        }
        blocks.extend(splitter.feed(&SAMPLE[start..]));
        assert_eq!((blocks, splitter.pending().to_string()), whole);

        let mut splitter = EventSplitter::new();
        // Resuming three bytes back would land inside `ñ`.
        assert!(splitter.feed("data: ñ\r\n").is_empty());
        assert_eq!(splitter.feed("\r\nnext"), vec!["data: ñ".to_string()]);
        assert_eq!(splitter.pending(), "next");
    }

    #[test]
    fn utf8_split_inside_character() {
        let text = "Tetun: ñ, é, ü 🌏";
        let bytes = text.as_bytes();
        for i in 0..=bytes.len() {
            let mut decoder = Utf8Decoder::new();
            let mut out = decoder.decode(&bytes[..i]);
            out.push_str(&decoder.decode(&bytes[i..]));
            assert_eq!(out, text, "split at byte {i}");
            assert_eq!(decoder.finish(), None);
        }
    }

    #[test]
    fn utf8_invalid_and_truncated() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"a\xffb"), "a\u{FFFD}b");
        assert_eq!(decoder.decode(b"c\xe2\x82"), "c");
        assert_eq!(decoder.finish(), Some(char::REPLACEMENT_CHARACTER));
        assert_eq!(decoder.decode(b"d"), "d");
    }
}
