//! services/client/src/adapters/events.rs
//!
//! Line splitter for the server-sent progress events of storybook generation.
//! Only `data: <json>` lines are events; anything else, or JSON that does not
//! parse, is skipped.

use serde_json::Value;
use tracing::debug;

const DATA_PREFIX: &str = "data: ";

/// Accumulates body chunks and yields the events of every completed line.
///
/// Lines may be split across chunks (including inside a UTF-8 sequence), so
/// the unfinished tail is kept until its newline arrives.
#[derive(Debug, Default)]
pub struct EventLines {
    pending: Vec<u8>,
}

impl EventLines {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Value> {
        self.pending.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(end) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=end).collect();
            events.extend(parse_line(&line));
        }
        events
    }

    /// Parses whatever is left once the body has ended.
    pub fn finish(&mut self) -> Option<Value> {
        let line = std::mem::take(&mut self.pending);
        parse_line(&line)
    }
}

fn parse_line(line: &[u8]) -> Option<Value> {
    let line = String::from_utf8_lossy(line);
    let data = line.trim_end().strip_prefix(DATA_PREFIX)?;
    match serde_json::from_str(data) {
        Ok(event) => Some(event),
        Err(e) => {
            debug!("Skipping unparseable progress event: {}", e);
            None
        }
    }
}
