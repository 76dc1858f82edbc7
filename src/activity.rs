use std::collections::VecDeque;

use chrono::{DateTime, Local};
use owo_colors::OwoColorize;
use tracing::info;

/// One line of the activity panel
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub at: DateTime<Local>,
    pub message: String,
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.at.format("%H:%M:%S"), self.message)
    }
}

/// Timestamped status lines, newest first. Each line is also emitted as
/// an `info` event.
///
/// Unbounded and in-memory only: nothing is deduplicated, truncated or
/// written to disk.
#[derive(Debug, Default)]
pub struct ActivityLog {
    entries: VecDeque<LogEntry>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&mut self, message: impl Into<String>) {
        self.log_at(Local::now(), message);
    }

    pub fn log_at(&mut self, at: DateTime<Local>, message: impl Into<String>) {
        let entry = LogEntry {
            at,
            message: message.into(),
        };
        info!("{}", entry.message);
        self.entries.push_front(entry);
    }

    pub fn entries(&self) -> &VecDeque<LogEntry> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Print the newest `limit` lines as the dashboard's log panel
    pub fn print_panel(&self, limit: usize) {
        println!("  {}", "Activity".bold().underline());
        if self.is_empty() {
            println!("    {}", "(nothing yet)".dimmed());
            return;
        }
        for entry in self.entries().iter().take(limit) {
            println!("    {}", entry.to_string().dimmed());
        }
        if self.len() > limit {
            println!(
                "    {}",
                format!("… {} older entries", self.len() - limit).dimmed()
            );
        }
    }
}
