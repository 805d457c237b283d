//! Pause and stop flags shared between the presentation layer and the
//! batch worker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cooperative run control.
///
/// Cloning shares the same flags. The worker only reads them; pausing
/// and stopping are requested from the outside.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    paused: Arc<AtomicBool>,
    stopped: Arc<AtomicBool>,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Holds the worker before its next file.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Flips between paused and running; returns the new paused state.
    pub fn toggle_pause(&self) -> bool {
        !self.paused.fetch_xor(true, Ordering::SeqCst)
    }

    /// Ends the run at the next file boundary. The file in progress
    /// still completes.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Blocks while paused, sleeping `poll` between checks.
    ///
    /// Returns false if the run was stopped, true if it may continue.
    pub(crate) fn wait_while_paused(&self, poll: Duration) -> bool {
        while self.is_paused() && !self.is_stopped() {
            std::thread::sleep(poll);
        }
        !self.is_stopped()
    }
}
