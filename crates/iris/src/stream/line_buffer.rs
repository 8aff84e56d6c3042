/// Incremental splitter for a byte stream of newline-terminated lines.
///
/// Bytes are decoded as UTF-8 as they arrive. A multi-byte sequence cut by a chunk boundary
/// is held back until its remaining bytes show up, and a line without its terminating newline
/// stays buffered until a later chunk completes it.
#[derive(Debug, Default)]
pub struct LineBuffer {
    undecoded: Vec<u8>,
    buffer: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chunk and return every line it completed, without line terminators
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.undecoded.extend_from_slice(chunk);
        self.decode();

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].find('\n') {
            let end = start + offset;
            let line = &self.buffer[start..end];
            let line = line.strip_suffix('\r').unwrap_or(line);
            lines.push(line.to_string());
            start = end + 1;
        }
        self.buffer.drain(..start);
        lines
    }

    /// Text received after the last newline
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Flush whatever is left once the stream has ended
    pub fn finish(&mut self) -> Option<String> {
        if !self.undecoded.is_empty() {
            self.buffer.push_str(&String::from_utf8_lossy(&self.undecoded));
            self.undecoded.clear();
        }
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }

    fn decode(&mut self) {
        loop {
            match std::str::from_utf8(&self.undecoded) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    self.undecoded.clear();
                    return;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    self.buffer.push_str(&String::from_utf8_lossy(&self.undecoded[..valid]));
                    match err.error_len() {
                        Some(invalid) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            self.undecoded.drain(..valid + invalid);
                        }
                        // incomplete sequence at the end, wait for more bytes
                        None => {
                            self.undecoded.drain(..valid);
                            return;
                        }
                    }
                }
            }
        }
    }
}
