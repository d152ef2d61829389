//! Shared message log primitives for CLI and future UIs.
use std::collections::VecDeque;

use runtime::AlertKind;

/// Severity level for UI messages produced from runtime events.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MessageLevel {
    Info,
    Success,
    Error,
}

impl From<AlertKind> for MessageLevel {
    fn from(kind: AlertKind) -> Self {
        match kind {
            AlertKind::Info => MessageLevel::Info,
            AlertKind::Success => MessageLevel::Success,
            AlertKind::Failure => MessageLevel::Error,
        }
    }
}

/// Snapshot of a single message entry.
#[derive(Clone, Debug)]
pub struct MessageEntry {
    pub text: String,
    /// Battle list version the message was received at, if known.
    pub update_counter: Option<u64>,
    pub level: MessageLevel,
}

impl MessageEntry {
    pub fn new(text: impl Into<String>, update_counter: Option<u64>, level: MessageLevel) -> Self {
        Self {
            text: text.into(),
            update_counter,
            level,
        }
    }
}

/// Circular buffer of messages displayed to the player.
///
/// The runtime keeps a single notification slot; this log is the history a
/// frontend keeps on top of it.
#[derive(Clone, Debug)]
pub struct MessageLog {
    entries: VecDeque<MessageEntry>,
    capacity: usize,
}

impl MessageLog {
    pub fn new(capacity: usize) -> Self {
        let bounded_capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(bounded_capacity),
            capacity: bounded_capacity,
        }
    }

    pub fn push(&mut self, entry: MessageEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn push_text(&mut self, message: impl Into<String>) {
        self.push(MessageEntry::new(message, None, MessageLevel::Info));
    }

    /// Newest first.
    pub fn recent(&self, limit: usize) -> impl Iterator<Item = &MessageEntry> {
        self.entries.iter().rev().take(limit)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MessageEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oldest_entries_are_evicted() {
        let mut log = MessageLog::new(2);
        log.push_text("one");
        log.push_text("two");
        log.push_text("three");

        let texts: Vec<_> = log.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["two", "three"]);

        let newest: Vec<_> = log.recent(1).map(|e| e.text.as_str()).collect();
        assert_eq!(newest, ["three"]);
    }

    #[test]
    fn zero_capacity_still_holds_one() {
        let mut log = MessageLog::new(0);
        log.push_text("kept");
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn failures_map_to_errors() {
        assert_eq!(MessageLevel::from(AlertKind::Failure), MessageLevel::Error);
        assert_eq!(MessageLevel::from(AlertKind::Success), MessageLevel::Success);
    }
}
