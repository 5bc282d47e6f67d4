//! Session log events.
//!
//! Readers, writers and the table projection report session-level events
//! (schema resolved, header written, input exhausted, table populated)
//! through a process-wide broadcast channel. Any number of subscribers can
//! listen. Nothing is printed unless a binary sets an echo level.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::broadcast;

/// Severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Part of the engine an entry comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    Reader,
    Writer,
    Projection,
    Cli,
}

impl Component {
    fn tag(&self) -> &'static str {
        match self {
            Component::Reader => "reader",
            Component::Writer => "writer",
            Component::Projection => "table",
            Component::Cli => "cli",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub component: Component,
    pub message: String,
    /// Input line the event refers to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Nesting depth for display
    #[serde(default)]
    pub indent: u8,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(level: LogLevel, component: Component, message: impl Into<String>) -> Self {
        Self {
            level,
            component,
            message: message.into(),
            line: None,
            indent: 0,
            timestamp: Utc::now(),
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    fn render(&self) -> String {
        let marker = match self.level {
            LogLevel::Info => " ",
            LogLevel::Success => "✓",
            LogLevel::Warning => "⚠️",
            LogLevel::Error => "❌",
        };
        let indent = "   ".repeat(self.indent as usize);
        match self.line {
            Some(line) => format!(
                "{}{} [{}] line {}: {}",
                indent,
                marker,
                self.component.tag(),
                line,
                self.message
            ),
            None => format!("{}{} [{}] {}", indent, marker, self.component.tag(), self.message),
        }
    }
}

/// Global log broadcaster
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

const ECHO_OFF: u8 = u8::MAX;

/// Broadcasts log entries to all subscribers
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
    /// Lowest level echoed to stderr, or `ECHO_OFF`.
    echo: AtomicU8,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self {
            sender,
            echo: AtomicU8::new(ECHO_OFF),
        }
    }

    /// Echo entries at `level` and above to stderr; `None` turns echo off.
    pub fn set_echo(&self, level: Option<LogLevel>) {
        let raw = level.map_or(ECHO_OFF, |l| l as u8);
        self.echo.store(raw, Ordering::Relaxed);
    }

    fn echoes(&self, level: LogLevel) -> bool {
        let threshold = self.echo.load(Ordering::Relaxed);
        threshold != ECHO_OFF && level as u8 >= threshold
    }

    pub fn log(&self, entry: LogEntry) {
        if self.echoes(entry.level) {
            eprintln!("{}", entry.render());
        }
        // No receivers is fine
        let _ = self.sender.send(entry);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

pub fn log_info(component: Component, msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Info, component, msg));
}

pub fn log_success(component: Component, msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Success, component, msg));
}

pub fn log_warning(component: Component, msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Warning, component, msg));
}

/// Warning tied to an input line.
pub fn log_warning_at(component: Component, line: usize, msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Warning, component, msg).at_line(line));
}

pub fn log_error(component: Component, msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Error, component, msg));
}

pub fn log_info_indent(component: Component, msg: impl Into<String>, indent: u8) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Info, component, msg).with_indent(indent));
}
