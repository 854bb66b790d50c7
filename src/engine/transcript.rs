use bytes::Bytes;

use crate::model::Stream;

/// Where a transcript entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Output(Stream),
    Input,
    Marker,
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub origin: Origin,
    pub data: Bytes,
}

/// Append-only record of everything a session produced or received.
///
/// Bytes are stored as delivered and only decoded when rendered, so a UTF-8
/// sequence split across two pipe reads comes out intact.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<Entry>,
    len: usize,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_output(&mut self, stream: Stream, data: Bytes) {
        self.push(Origin::Output(stream), data);
    }

    /// Record a line typed by the operator. The reader strips the delimiter,
    /// so it is restored here.
    pub fn push_input_line(&mut self, line: &str) {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        self.push(Origin::Input, Bytes::from(buf));
    }

    pub fn push_marker(&mut self, text: impl Into<String>) {
        self.push(Origin::Marker, Bytes::from(text.into()));
    }

    fn push(&mut self, origin: Origin, data: Bytes) {
        if data.is_empty() {
            return;
        }
        self.len += data.len();
        self.entries.push(Entry { origin, data });
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Total number of bytes recorded.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn render(&self) -> String {
        let mut raw = Vec::with_capacity(self.len);
        for entry in &self.entries {
            raw.extend_from_slice(&entry.data);
        }
        String::from_utf8_lossy(&raw).into_owned()
    }
}
