use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Point-in-time copy of the display counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub frames_dispatched: u64,
    pub frames_rejected: u64,
    pub slices_transferred: u64,
    pub slices_discarded: u64,
    pub swaps: u64,
    pub renders: u64,
    pub render_failures: u64,
    pub ownership_violations: u64,
    pub buffer_growths: u64,
    pub lock_waits: u64,
    pub dropped_events: u64,
    pub avg_render_latency_us: u64,
}

/// Counters shared by the dispatcher, workers and renderer
#[derive(Debug, Default)]
pub struct DisplayMetrics {
    frames_dispatched: AtomicU64,
    frames_rejected: AtomicU64,
    slices_transferred: AtomicU64,
    slices_discarded: AtomicU64,
    swaps: AtomicU64,
    renders: AtomicU64,
    render_failures: AtomicU64,
    ownership_violations: AtomicU64,
    buffer_growths: AtomicU64,
    lock_waits: AtomicU64,
    dropped_events: AtomicU64,
    total_render_us: AtomicU64,
}

impl DisplayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame_dispatched(&self) {
        self.frames_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame_rejected(&self) {
        self.frames_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_slice_transferred(&self) {
        self.slices_transferred.fetch_add(1, Ordering::Relaxed);
    }

    /// Slice dropped because its grid was being torn down
    pub fn record_slice_discarded(&self) {
        self.slices_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_swap(&self) {
        self.swaps.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_render_failure(&self) {
        self.render_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ownership_violation(&self) {
        self.ownership_violations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_buffer_growth(&self) {
        self.buffer_growths.fetch_add(1, Ordering::Relaxed);
    }

    /// A swap found the lock taken and had to wait
    pub fn record_lock_wait(&self) {
        self.lock_waits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped_event(&self) {
        self.dropped_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn start_render(&self) -> Instant {
        Instant::now()
    }

    pub fn finish_render(&self, start: Instant) {
        let latency_us = start.elapsed().as_micros() as u64;
        self.total_render_us.fetch_add(latency_us, Ordering::Relaxed);
        self.renders.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frames_dispatched(&self) -> u64 {
        self.frames_dispatched.load(Ordering::Relaxed)
    }

    pub fn swaps(&self) -> u64 {
        self.swaps.load(Ordering::Relaxed)
    }

    pub fn renders(&self) -> u64 {
        self.renders.load(Ordering::Relaxed)
    }

    pub fn render_failures(&self) -> u64 {
        self.render_failures.load(Ordering::Relaxed)
    }

    pub fn ownership_violations(&self) -> u64 {
        self.ownership_violations.load(Ordering::Relaxed)
    }

    pub fn buffer_growths(&self) -> u64 {
        self.buffer_growths.load(Ordering::Relaxed)
    }

    pub fn lock_waits(&self) -> u64 {
        self.lock_waits.load(Ordering::Relaxed)
    }

    pub fn avg_render_latency_us(&self) -> u64 {
        let renders = self.renders.load(Ordering::Relaxed);
        if renders == 0 {
            return 0;
        }
        self.total_render_us.load(Ordering::Relaxed) / renders
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_dispatched: self.frames_dispatched(),
            frames_rejected: self.frames_rejected.load(Ordering::Relaxed),
            slices_transferred: self.slices_transferred.load(Ordering::Relaxed),
            slices_discarded: self.slices_discarded.load(Ordering::Relaxed),
            swaps: self.swaps(),
            renders: self.renders(),
            render_failures: self.render_failures(),
            ownership_violations: self.ownership_violations(),
            buffer_growths: self.buffer_growths(),
            lock_waits: self.lock_waits(),
            dropped_events: self.dropped_events.load(Ordering::Relaxed),
            avg_render_latency_us: self.avg_render_latency_us(),
        }
    }
}
