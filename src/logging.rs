use std::io;
use tracing::Level;

/// Buffers one formatted event and hands it to the browser console on drop.
#[derive(Default)]
struct ConsoleWriter(Vec<u8>);

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if let Some(line) = console_line(&self.0) {
            leptos::logging::log!("{}", line);
        }
    }
}

fn console_line(buf: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(buf);
    let line = line.trim_end();
    (!line.is_empty()).then(|| line.to_string())
}

/// Routes the client library's `tracing` events to the console.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_writer(ConsoleWriter::default)
        .with_max_level(Level::INFO)
        .with_target(false)
        .without_time()
        .try_init();
}
