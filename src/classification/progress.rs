// src/classification/progress.rs
//
// Progress observers. The classifier reports (processed, total) after every
// driving track; observers must not touch classification state.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::info;

pub trait ProgressObserver: Sync {
    fn report(&self, processed: usize, total: usize);
}

/// Discards every report
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn report(&self, _processed: usize, _total: usize) {}
}

/// Logs `Progress: N%` once per `interval_percent` step.
pub struct LogProgress {
    interval_percent: f64,
    next_step: AtomicU64,
}

impl LogProgress {
    pub fn new(interval_percent: f64) -> Self {
        Self {
            interval_percent: interval_percent.max(f64::EPSILON),
            next_step: AtomicU64::new(0),
        }
    }

    /// Claim the next reporting step if `percent` has reached it.
    fn claim_step(&self, percent: f64) -> bool {
        self.next_step
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |step| {
                (percent >= step as f64 * self.interval_percent).then_some(step + 1)
            })
            .is_ok()
    }
}

impl ProgressObserver for LogProgress {
    fn report(&self, processed: usize, total: usize) {
        if total == 0 {
            return;
        }
        let percent = 100.0 * processed as f64 / total as f64;
        if self.claim_step(percent) {
            info!("Progress: {}%", percent.round());
        }
    }
}

/// Shared tick counter handed to every group worker.
pub(crate) struct ProgressCounter<'a> {
    processed: AtomicUsize,
    total: usize,
    observer: &'a dyn ProgressObserver,
}

impl<'a> ProgressCounter<'a> {
    pub(crate) fn new(total: usize, observer: &'a dyn ProgressObserver) -> Self {
        Self {
            processed: AtomicUsize::new(0),
            total,
            observer,
        }
    }

    pub(crate) fn tick(&self) {
        let processed = self.processed.fetch_add(1, Ordering::Relaxed) + 1;
        self.observer.report(processed, self.total);
    }

    pub(crate) fn processed(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }
}
