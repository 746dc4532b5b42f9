//! Narrative message log.

use std::fmt;

use serde::{Deserialize, Serialize};

use grotto_ecs::component::Color;

/// One log line. `count` is how many times the same text arrived in a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub text: String,
    pub color: Color,
    pub count: u32,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count > 1 {
            write!(f, "{} ({}x)", self.text, self.count)
        } else {
            f.write_str(&self.text)
        }
    }
}

/// Append-only message history. A message repeating the previous entry's
/// text bumps that entry's count instead of adding a line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLog {
    entries: Vec<LogEntry>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: impl Into<String>, color: Color) {
        let text = text.into();
        if let Some(last) = self.entries.last_mut() {
            if last.text == text {
                last.count += 1;
                return;
            }
        }
        tracing::trace!(%text, "log");
        self.entries.push(LogEntry {
            text,
            color,
            count: 1,
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
