use enrich::BackfillReport;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

pub struct PipelineMetrics {
    // Words
    words_seen: AtomicUsize,
    words_completed: AtomicUsize,
    words_skipped: AtomicUsize,

    // Output
    entries_emitted: AtomicUsize,
    fields_backfilled: AtomicUsize,
    fields_failed: AtomicUsize,

    // Timing (in microseconds)
    total_word_time_us: AtomicU64,
}

impl PipelineMetrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            words_seen: AtomicUsize::new(0),
            words_completed: AtomicUsize::new(0),
            words_skipped: AtomicUsize::new(0),
            entries_emitted: AtomicUsize::new(0),
            fields_backfilled: AtomicUsize::new(0),
            fields_failed: AtomicUsize::new(0),
            total_word_time_us: AtomicU64::new(0),
        })
    }

    pub fn record_seen(&self) {
        self.words_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_completed(&self, duration: Duration, entries: usize, report: BackfillReport) {
        self.words_completed.fetch_add(1, Ordering::Relaxed);
        self.entries_emitted.fetch_add(entries, Ordering::Relaxed);
        self.fields_backfilled.fetch_add(report.filled, Ordering::Relaxed);
        self.fields_failed.fetch_add(report.failed, Ordering::Relaxed);
        self.add_time(duration);
    }

    pub fn record_skipped(&self, duration: Duration) {
        self.words_skipped.fetch_add(1, Ordering::Relaxed);
        self.add_time(duration);
    }

    fn add_time(&self, duration: Duration) {
        self.total_word_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let finished = self.words_completed.load(Ordering::Relaxed)
            + self.words_skipped.load(Ordering::Relaxed);
        let total_us = self.total_word_time_us.load(Ordering::Relaxed);

        MetricsSnapshot {
            words_seen: self.words_seen.load(Ordering::Relaxed),
            words_completed: self.words_completed.load(Ordering::Relaxed),
            words_skipped: self.words_skipped.load(Ordering::Relaxed),
            entries_emitted: self.entries_emitted.load(Ordering::Relaxed),
            fields_backfilled: self.fields_backfilled.load(Ordering::Relaxed),
            fields_failed: self.fields_failed.load(Ordering::Relaxed),
            total_time_ms: total_us as f64 / 1000.0,
            avg_word_time_ms: if finished > 0 {
                total_us as f64 / finished as f64 / 1000.0 // Convert to ms
            } else {
                0.0
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub words_seen: usize,
    pub words_completed: usize,
    pub words_skipped: usize,
    pub entries_emitted: usize,
    pub fields_backfilled: usize,
    pub fields_failed: usize,
    pub total_time_ms: f64,
    pub avg_word_time_ms: f64,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
