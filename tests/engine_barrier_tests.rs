use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, Receiver};
use meaview::engine::{ReadyOutcome, RenderCommand, SharedSurface, SyncBarrier};

fn barrier(channels: usize) -> (Arc<SharedSurface>, Arc<SyncBarrier>, Receiver<RenderCommand>) {
    let (surface, _writers) = SharedSurface::with_writers(channels);
    let (tx, rx) = unbounded();
    (surface, Arc::new(SyncBarrier::new(channels, tx)), rx)
}

#[test]
fn test_render_waits_for_every_channel() {
    let (surface, barrier, rx) = barrier(4);

    for channel in 0..3 {
        let guard = surface.read();
        assert_eq!(
            barrier.mark_ready(channel, &guard),
            ReadyOutcome::Pending {
                ready: channel + 1,
                total: 4
            }
        );
    }
    assert!(rx.try_recv().is_err());

    let guard = surface.read();
    assert_eq!(
        barrier.mark_ready(3, &guard),
        ReadyOutcome::Completed { round: 1 }
    );
    drop(guard);

    assert_eq!(rx.try_recv().unwrap(), RenderCommand::Render { round: 1 });
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_repeated_mark_counts_once() {
    let (surface, barrier, _rx) = barrier(2);
    let guard = surface.read();

    barrier.mark_ready(0, &guard);
    assert_eq!(barrier.mark_ready(0, &guard), ReadyOutcome::AlreadyReady);
    assert_eq!(barrier.ready_count(), 1);
}

#[test]
fn test_no_second_trigger_until_reset() {
    let (surface, barrier, rx) = barrier(2);
    {
        let guard = surface.read();
        barrier.mark_ready(0, &guard);
        barrier.mark_ready(1, &guard);
        assert_eq!(barrier.mark_ready(1, &guard), ReadyOutcome::AlreadyReady);
    }
    assert_eq!(rx.try_iter().count(), 1);

    barrier.reset(&surface.write());
    assert_eq!(barrier.ready_count(), 0);
    assert!(!barrier.is_ready(0));

    let guard = surface.read();
    barrier.mark_ready(1, &guard);
    assert_eq!(
        barrier.mark_ready(0, &guard),
        ReadyOutcome::Completed { round: 2 }
    );
    assert_eq!(barrier.rounds(), 2);
}

#[test]
fn test_unknown_channel_ignored() {
    let (surface, barrier, rx) = barrier(1);
    let guard = surface.read();

    assert_eq!(barrier.mark_ready(5, &guard), ReadyOutcome::Unknown);
    assert_eq!(barrier.ready_count(), 0);
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_concurrent_marks_trigger_exactly_once() {
    let channels = 64;
    let threads = 8;
    let (surface, barrier, rx) = barrier(channels);
    let start = Arc::new(std::sync::Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let surface = Arc::clone(&surface);
            let barrier = Arc::clone(&barrier);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                let mut completed = 0;
                for channel in (t..channels).step_by(threads) {
                    let guard = surface.read();
                    if let ReadyOutcome::Completed { .. } = barrier.mark_ready(channel, &guard) {
                        completed += 1;
                    }
                }
                completed
            })
        })
        .collect();

    let completed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(completed, 1);
    assert_eq!(rx.try_iter().count(), 1);
    assert_eq!(barrier.ready_count(), channels);
}
