use meaview::observability::{DisplayMetrics, DisplayMonitor};
use std::sync::Arc;

#[test]
fn test_monitor_report() {
    let metrics = Arc::new(DisplayMetrics::new());

    metrics.record_frame_dispatched();
    metrics.record_frame_dispatched();
    metrics.record_swap();
    let start = metrics.start_render();
    metrics.finish_render(start);
    metrics.record_render_failure();

    let monitor = DisplayMonitor::new(metrics);
    let report = monitor.generate_report();

    assert!(report.contains("=== Display Metrics ==="));
    assert!(report.contains("2 dispatched"));
    assert!(report.contains("1 renders"));
    assert!(report.contains("1 failure"));
}

#[test]
fn test_monitor_report_without_failures() {
    let monitor = DisplayMonitor::new(Arc::new(DisplayMetrics::new()));
    let report = monitor.generate_report();

    assert!(report.contains("0 failures"));
    assert!(report.contains("0 renders"));
}
