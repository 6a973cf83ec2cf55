use std::collections::VecDeque;

use chrono::{DateTime, Utc};

/// Maximum number of messages kept
pub const STATUS_CAPACITY: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl StatusLevel {
    fn log_level(self) -> log::Level {
        match self {
            StatusLevel::Info | StatusLevel::Success => log::Level::Info,
            StatusLevel::Warning => log::Level::Warn,
            StatusLevel::Error => log::Level::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub id: u64,
    pub level: StatusLevel,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// User-facing notifications, newest first
#[derive(Debug, Clone, Default)]
pub struct StatusLog {
    messages: VecDeque<StatusMessage>,
    next_id: u64,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message and mirror it to the log facade
    pub fn push(&mut self, text: impl Into<String>, level: StatusLevel) {
        let text = text.into();
        log::log!(target: "status", level.log_level(), "{text}");

        self.next_id += 1;
        self.messages.push_front(StatusMessage {
            id: self.next_id,
            level,
            text,
            timestamp: Utc::now(),
        });
        self.messages.truncate(STATUS_CAPACITY);
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(text, StatusLevel::Info);
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.push(text, StatusLevel::Success);
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        self.push(text, StatusLevel::Warning);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(text, StatusLevel::Error);
    }

    pub fn latest(&self) -> Option<&StatusMessage> {
        self.messages.front()
    }

    /// Newest first
    pub fn messages(&self) -> impl Iterator<Item = &StatusMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
