//! Minimal server-sent events decoder for upstream streaming APIs.
//!
//! Only `data:` fields are collected. Other fields and comments are skipped.

/// Incremental SSE decoder. Feed raw bytes, get complete event payloads.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a chunk of bytes and return the payloads of every event it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(raw) = self.next_line() {
            let line = String::from_utf8_lossy(&raw).into_owned();
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }

        events
    }

    /// Flush an event left open when the stream ended without a blank line.
    pub fn finish(&mut self) -> Option<String> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest).into_owned();
            if let Some(event) = self.process_line(line.trim_end_matches('\r')) {
                return Some(event);
            }
        }
        self.take_event()
    }

    /// Split off the next complete line, ended by `\n`, `\r\n` or a lone `\r`.
    ///
    /// A trailing `\r` stays buffered until the next byte shows whether a `\n` follows.
    fn next_line(&mut self) -> Option<Vec<u8>> {
        let pos = self
            .buffer
            .iter()
            .position(|b| *b == b'\n' || *b == b'\r')?;

        let end = if self.buffer[pos] == b'\r' {
            match self.buffer.get(pos + 1) {
                None => return None,
                Some(b'\n') => pos + 2,
                Some(_) => pos + 1,
            }
        } else {
            pos + 1
        };

        let mut line: Vec<u8> = self.buffer.drain(..end).collect();
        line.truncate(pos);
        Some(line)
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.take_event();
        }
        if let Some(value) = line.strip_prefix("data:") {
            self.data
                .push(value.strip_prefix(' ').unwrap_or(value).to_string());
        }
        None
    }

    fn take_event(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        let event = self.data.join("\n");
        self.data.clear();
        Some(event)
    }
}
