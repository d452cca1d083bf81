//! Progress reporting and cancellation for long-running estimators.

/// Observer injected into the estimators.
///
/// `progress` is called with the number of completed work units and the
/// total; `cancelled` is polled between units and aborts the run with
/// [`crate::Error::Cancelled`] when it returns true.
pub trait Monitor {
    fn progress(&mut self, done: usize, total: usize);

    fn cancelled(&self) -> bool {
        false
    }
}

/// Monitor that ignores progress and never cancels.
#[derive(Debug, Default)]
pub struct NullMonitor;

impl Monitor for NullMonitor {
    fn progress(&mut self, _done: usize, _total: usize) {}
}

/// Monitor that logs the completion percentage every `interval` units.
#[derive(Debug)]
pub struct LogMonitor {
    interval: usize,
}

impl LogMonitor {
    pub fn new(interval: usize) -> Self {
        Self {
            interval: interval.max(1),
        }
    }
}

impl Default for LogMonitor {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl Monitor for LogMonitor {
    fn progress(&mut self, done: usize, total: usize) {
        if done % self.interval == 0 || done == total {
            let progress = 100.0 * done as f64 / total as f64;
            log::info!("completed {progress:06.2}%");
        }
    }
}
