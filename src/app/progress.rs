use crate::domain::model::{AstralObject, RunSummary};
use crate::domain::ports::ProgressObserver;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Logs each step of a run through `tracing`.
pub struct ConsoleProgressObserver {
    action: &'static str,
}

impl ConsoleProgressObserver {
    pub fn new(action: &'static str) -> Self {
        Self { action }
    }
}

impl Default for ConsoleProgressObserver {
    fn default() -> Self {
        Self::new("creation")
    }
}

impl ProgressObserver for ConsoleProgressObserver {
    fn on_start(&self, total: usize) {
        tracing::info!("🌌 Starting megaverse {} with {} objects", self.action, total);
    }

    fn on_progress(&self, current: usize, total: usize, object: &AstralObject, success: bool) {
        let status = if success { "✅" } else { "❌" };
        let width = total.to_string().len();
        tracing::info!("   [{:>width$}/{}] {} {}", current, total, status, object, width = width);
    }

    fn on_complete(&self, summary: &RunSummary) {
        tracing::info!("🎉 Megaverse {} complete!", self.action);
        tracing::info!("   ✅ Successful: {}", summary.successful);
        tracing::info!("   ❌ Failed: {}", summary.failed);
        tracing::info!("   📊 Total: {}", summary.total);
        if let Some(elapsed) = summary.elapsed() {
            tracing::info!("   ⏱️  Elapsed: {}s", elapsed.num_seconds());
        }
    }
}

/// Counts observer callbacks. Handy in tests and for callers that only need totals.
#[derive(Debug, Default)]
pub struct CountingObserver {
    pub started: AtomicUsize,
    pub succeeded: AtomicUsize,
    pub failed: AtomicUsize,
    pub completed: AtomicUsize,
}

impl ProgressObserver for CountingObserver {
    fn on_start(&self, _total: usize) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn on_progress(&self, _current: usize, _total: usize, _object: &AstralObject, success: bool) {
        if success {
            self.succeeded.fetch_add(1, Ordering::SeqCst);
        } else {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn on_complete(&self, _summary: &RunSummary) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
}
