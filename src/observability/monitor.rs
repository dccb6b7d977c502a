use std::sync::Arc;

use super::DisplayMetrics;

pub struct DisplayMonitor {
    metrics: Arc<DisplayMetrics>,
}

impl DisplayMonitor {
    pub fn new(metrics: Arc<DisplayMetrics>) -> Self {
        Self { metrics }
    }

    pub fn generate_report(&self) -> String {
        let s = self.metrics.snapshot();

        let mut report = String::from("=== Display Metrics ===\n");
        report.push_str(&format!(
            "\n[transfer]\n  Frames: {} dispatched, {} rejected\n  Slices: {} transferred, {} discarded\n  Swaps: {}\n  Buffer growths: {}\n  Lock waits: {}\n  Ownership violations: {}\n",
            s.frames_dispatched,
            s.frames_rejected,
            s.slices_transferred,
            s.slices_discarded,
            s.swaps,
            s.buffer_growths,
            s.lock_waits,
            s.ownership_violations,
        ));
        report.push_str(&format!(
            "\n[render]\n  Renders: {} renders\n  Failures: {}\n  Avg Latency: {}μs\n  Dropped events: {}\n",
            s.renders,
            if s.render_failures > 0 {
                format!(
                    "{} failure{}",
                    s.render_failures,
                    if s.render_failures == 1 { "" } else { "s" }
                )
            } else {
                "0 failures".to_string()
            },
            s.avg_render_latency_us,
            s.dropped_events,
        ));

        report
    }

    pub fn metrics(&self) -> &Arc<DisplayMetrics> {
        &self.metrics
    }
}
