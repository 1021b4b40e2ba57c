//! crates/storybook_core/src/progress.rs
//!
//! Progress reporting for generation runs. Reports are advisory UI feedback;
//! the reporter only guarantees that percentages never go backwards.

use crate::domain::ProgressUpdate;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::debug;

pub const STARTED: u8 = 0;
pub const CHECKING_BACKEND: u8 = 10;
pub const WRITING_STORY: u8 = 20;
pub const STORY_RECEIVED: u8 = 40;
pub const ILLUSTRATING: u8 = 60;
pub const ILLUSTRATIONS_DONE: u8 = 80;
pub const COMPLETE: u8 = 100;

/// Receives progress updates from a generation run.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, update: &ProgressUpdate);
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressUpdate) + Send + Sync,
{
    fn on_progress(&self, update: &ProgressUpdate) {
        self(update)
    }
}

/// Percentage reached once `completed` of `total` illustrations are settled.
///
/// Derived only from the ratio, so it lands on [`ILLUSTRATIONS_DONE`] when all
/// are settled and stays at [`ILLUSTRATING`] for a story without chapters.
pub fn illustration_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return ILLUSTRATING;
    }
    let completed = completed.min(total);
    let span = (ILLUSTRATIONS_DONE - ILLUSTRATING) as usize;
    ILLUSTRATING + (span * completed / total) as u8
}

/// Forwards updates to an observer, clamping them so they never decrease.
pub struct ProgressReporter<'a> {
    observer: &'a dyn ProgressObserver,
    last: AtomicU8,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(observer: &'a dyn ProgressObserver) -> Self {
        Self {
            observer,
            last: AtomicU8::new(STARTED),
        }
    }

    pub fn report(&self, percent: u8, message: impl Into<String>) {
        let percent = percent.min(COMPLETE).max(self.last.load(Ordering::Relaxed));
        self.last.store(percent, Ordering::Relaxed);

        let update = ProgressUpdate {
            percent,
            message: message.into(),
        };
        debug!(percent = update.percent, message = %update.message, "generation progress");
        self.observer.on_progress(&update);
    }
}
