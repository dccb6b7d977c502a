use meaview::observability::DisplayMetrics;
use std::sync::Arc;
use std::thread;

#[test]
fn test_metrics_creation() {
    let metrics = DisplayMetrics::new();
    assert_eq!(metrics.frames_dispatched(), 0);
    assert_eq!(metrics.renders(), 0);
    assert_eq!(metrics.avg_render_latency_us(), 0);
}

#[test]
fn test_metrics_increment() {
    let metrics = Arc::new(DisplayMetrics::new());

    metrics.record_swap();
    metrics.record_swap();
    assert_eq!(metrics.swaps(), 2);

    metrics.record_ownership_violation();
    metrics.record_buffer_growth();
    metrics.record_lock_wait();
    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.ownership_violations, 1);
    assert_eq!(snapshot.buffer_growths, 1);
    assert_eq!(snapshot.lock_waits, 1);
}

#[test]
fn test_metrics_shared_across_threads() {
    let metrics = Arc::new(DisplayMetrics::new());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let metrics = Arc::clone(&metrics);
            thread::spawn(move || {
                for _ in 0..250 {
                    metrics.record_slice_transferred();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(metrics.snapshot().slices_transferred, 1000);
}

#[tokio::test]
async fn test_metrics_latency_tracking() {
    let metrics = DisplayMetrics::new();

    let start = metrics.start_render();
    tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    metrics.finish_render(start);

    assert_eq!(metrics.renders(), 1);
    assert!(metrics.avg_render_latency_us() >= 10_000); // At least 10ms in microseconds
}
