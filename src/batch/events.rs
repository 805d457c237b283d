//! Messages from the batch worker to the presentation layer.
//!
//! The worker never touches presentation state. It posts [`RunEvent`]s on
//! a channel; the presentation side drains them in bounded batches and
//! applies them to its own copy of the file list.

use std::path::PathBuf;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};

use crate::domain::{FileEntry, FileStatus};

/// Events handed to the presentation layer per drain.
pub const DRAIN_BATCH_SIZE: usize = 20;

/// How long a drain waits for the first event.
pub const DRAIN_INTERVAL: Duration = Duration::from_millis(50);

/// Severity of a per-file log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Aggregate counters of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub success: usize,
    pub failed: usize,
    /// 0 or 1; files are processed one at a time.
    pub processing: usize,
    pub waiting: usize,
}

impl RunStats {
    pub fn new(total: usize) -> Self {
        Self {
            waiting: total,
            ..Default::default()
        }
    }

    pub fn completed(&self) -> usize {
        self.success + self.failed
    }
}

/// Final state of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Every file with the status it ended in.
    pub files: Vec<FileEntry>,
    pub stats: RunStats,
    /// True if the run ended because stop was requested.
    pub stopped: bool,
    /// Directory of the first cleaned copy written.
    pub output_dir: Option<PathBuf>,
}

/// One update from the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// A file changed state.
    Status { index: usize, status: FileStatus },
    /// A log line, attached to a file when `index` is set.
    Log {
        index: Option<usize>,
        level: LogLevel,
        message: String,
    },
    Stats(RunStats),
    /// Files finished so far out of the total.
    Progress { completed: usize, total: usize },
    /// Sent once, as the last event of a run.
    Finished(RunSummary),
}

impl RunEvent {
    /// Applies a status change to the presentation's file list.
    ///
    /// Returns true if the list changed.
    pub fn apply_to(&self, files: &mut [FileEntry]) -> bool {
        match self {
            RunEvent::Status { index, status } => match files.get_mut(*index) {
                Some(entry) if entry.status != *status => {
                    entry.status = *status;
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, RunEvent::Finished(_))
    }
}

/// Drains worker events in bounded batches.
pub struct EventDrain {
    rx: Receiver<RunEvent>,
    batch_size: usize,
    interval: Duration,
}

impl EventDrain {
    pub fn new(rx: Receiver<RunEvent>) -> Self {
        Self::with_limits(rx, DRAIN_BATCH_SIZE, DRAIN_INTERVAL)
    }

    pub fn with_limits(rx: Receiver<RunEvent>, batch_size: usize, interval: Duration) -> Self {
        Self {
            rx,
            batch_size: batch_size.max(1),
            interval,
        }
    }

    /// Waits up to the interval for events and returns at most one batch.
    ///
    /// An empty batch means nothing arrived in time. `None` means the
    /// worker is gone and every event has been delivered.
    pub fn next_batch(&self) -> Option<Vec<RunEvent>> {
        let first = match self.rx.recv_timeout(self.interval) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => return Some(Vec::new()),
            Err(RecvTimeoutError::Disconnected) => return None,
        };

        let mut batch = Vec::with_capacity(self.batch_size);
        batch.push(first);
        while batch.len() < self.batch_size {
            match self.rx.try_recv() {
                Ok(event) => batch.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        Some(batch)
    }
}
