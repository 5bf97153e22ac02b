//! Progress reporting and cooperative cancellation.
//!
//! The pipeline reports everything as free-text lines through a
//! [`ProgressSink`] and polls it for cancellation between stages.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Line-oriented progress sink with a cancellation query.
pub trait ProgressSink {
    /// Push one human-readable line.
    fn push_info(&mut self, message: &str);

    /// Whether the caller asked the conversion to stop.
    fn is_canceled(&self) -> bool {
        false
    }
}

impl<S: ProgressSink + ?Sized> ProgressSink for &mut S {
    fn push_info(&mut self, message: &str) {
        (**self).push_info(message);
    }

    fn is_canceled(&self) -> bool {
        (**self).is_canceled()
    }
}

/// Shared cancellation flag. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Forwards each line to the `log` facade at info level.
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    cancel: CancelFlag,
}

impl LogSink {
    pub fn new(cancel: CancelFlag) -> Self {
        Self { cancel }
    }
}

impl ProgressSink for LogSink {
    fn push_info(&mut self, message: &str) {
        log::info!(target: "demraw", "{message}");
    }

    fn is_canceled(&self) -> bool {
        self.cancel.is_set()
    }
}

/// Writes each line to stderr.
#[derive(Debug, Clone, Default)]
pub struct ConsoleSink {
    cancel: CancelFlag,
}

impl ConsoleSink {
    pub fn new(cancel: CancelFlag) -> Self {
        Self { cancel }
    }
}

impl ProgressSink for ConsoleSink {
    fn push_info(&mut self, message: &str) {
        eprintln!("{message}");
    }

    fn is_canceled(&self) -> bool {
        self.cancel.is_set()
    }
}

/// Keeps every line in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    lines: Vec<String>,
    cancel: CancelFlag,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(cancel: CancelFlag) -> Self {
        Self {
            lines: Vec::new(),
            cancel,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    /// True if any recorded line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}

impl ProgressSink for RecordingSink {
    fn push_info(&mut self, message: &str) {
        log::debug!(target: "demraw", "{message}");
        self.lines.push(message.to_string());
    }

    fn is_canceled(&self) -> bool {
        self.cancel.is_set()
    }
}
