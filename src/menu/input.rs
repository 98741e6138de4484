use std::io::{self, BufRead};

/// Pulls whitespace-delimited tokens and whole lines from an interactive stream.
pub struct InputReader<R> {
    reader: R,
    pending: String,
}

impl<R: BufRead> InputReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: String::new(),
        }
    }

    /// Next token, reading more lines as needed. `None` at end of input.
    pub fn next_token(&mut self) -> io::Result<Option<String>> {
        loop {
            let rest = self.pending.trim_start();
            if !rest.is_empty() {
                let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
                let token = rest[..end].to_string();
                let remainder = rest[end..].to_string();
                self.pending = remainder;
                return Ok(Some(token));
            }

            self.pending.clear();
            if self.reader.read_line(&mut self.pending)? == 0 {
                return Ok(None);
            }
        }
    }

    /// Free-text line with embedded spaces preserved.
    ///
    /// Text left on the current line after the last token is returned first,
    /// minus the single separator that ended the token; otherwise the next full
    /// line is read. Only the line ending is stripped either way.
    pub fn next_line(&mut self) -> io::Result<Option<String>> {
        let rest = self.pending.trim_end_matches(['\r', '\n']);
        let rest = rest.strip_prefix(char::is_whitespace).unwrap_or(rest);
        if !rest.trim().is_empty() {
            let line = rest.to_string();
            self.pending.clear();
            return Ok(Some(line));
        }
        self.pending.clear();

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}
