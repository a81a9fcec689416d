//! Shared completion counter for a batch.

use std::fmt;
use std::sync::Mutex;

/// Default reporting cadence
pub const DEFAULT_REPORT_EVERY: usize = 10;

type Observer = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Counts completed rows and notifies an observer every `every`-th
/// completion and on the final one.
///
/// The count and the observer call happen under one lock, so concurrent
/// completions are never lost or reported out of order.
pub struct Progress {
    total: usize,
    every: usize,
    completed: Mutex<usize>,
    observer: Option<Observer>,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            every: DEFAULT_REPORT_EVERY,
            completed: Mutex::new(0),
            observer: None,
        }
    }

    /// Report every `every` completions (0 is treated as 1)
    pub fn every(mut self, every: usize) -> Self {
        self.every = every.max(1);
        self
    }

    /// Observer receives `(completed, total)`
    pub fn with_observer(mut self, observer: impl Fn(usize, usize) + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Record one completed row, returning the new count.
    pub fn tick(&self) -> usize {
        let mut completed = self.completed.lock().unwrap_or_else(|e| e.into_inner());
        *completed += 1;
        let n = *completed;
        if n % self.every == 0 || n == self.total {
            if let Some(observer) = &self.observer {
                observer(n, self.total);
            }
        }
        n
    }

    pub fn completed(&self) -> usize {
        *self.completed.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Progress")
            .field("total", &self.total)
            .field("every", &self.every)
            .field("completed", &self.completed())
            .finish()
    }
}
