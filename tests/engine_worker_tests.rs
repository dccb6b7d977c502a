use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver};
use meaview::buffers::{ChannelBuffer, FormatSettings};
use meaview::core::{ChannelSlice, DataFrame};
use meaview::engine::{
    ChannelWorker, Dispatcher, FrontWriter, OwnerAssignment, ReadyOutcome, RenderCommand,
    SharedSurface, SyncBarrier, TransferOutcome, WorkerContext, WorkerPool, WorkerSettings,
};
use meaview::observability::DisplayMetrics;
use meaview::DisplayError;

fn grid(channels: usize) -> (WorkerContext, Vec<FrontWriter>, Receiver<RenderCommand>) {
    let (surface, writers) = SharedSurface::with_writers(channels);
    let (tx, rx) = unbounded();
    let context = WorkerContext {
        surface,
        barrier: Arc::new(SyncBarrier::new(channels, tx)),
        metrics: Arc::new(DisplayMetrics::new()),
        cancelled: Arc::new(AtomicBool::new(false)),
    };
    (context, writers, rx)
}

/// Block size = refresh * rate
fn settings(refresh_interval: f64, sample_rate: f64) -> WorkerSettings {
    WorkerSettings {
        refresh_interval,
        sample_rate,
        format: FormatSettings::default(),
    }
}

fn single_channel_worker(block_size: usize) -> (ChannelWorker, WorkerContext, Receiver<RenderCommand>) {
    let (context, mut writers, rx) = grid(1);
    let writer = writers.remove(0);
    let worker = ChannelWorker::new(
        0,
        vec![(ChannelBuffer::new(0, block_size), writer)],
        context.clone(),
        FormatSettings::default(),
    );
    (worker, context, rx)
}

#[test]
fn test_slice_for_foreign_channel_is_rejected() {
    let (context, mut writers, _rx) = grid(2);
    let writer = writers.remove(0);
    let mut worker = ChannelWorker::new(
        0,
        vec![(ChannelBuffer::new(0, 10), writer)],
        context.clone(),
        FormatSettings::default(),
    );

    let result = worker.transfer(ChannelSlice::new(1, vec![1; 10], 1.0), false);

    assert_eq!(
        result,
        Err(DisplayError::OwnershipViolation {
            channel: 1,
            worker: 0
        })
    );
    assert_eq!(context.metrics.ownership_violations(), 1);
    assert_eq!(worker.buffer(0).unwrap().back_position(), 0);
    assert!(!worker.owns(1));
}

#[test]
fn test_partial_block_accumulates() {
    let (mut worker, _context, rx) = single_channel_worker(10);

    let outcome = worker
        .transfer(ChannelSlice::new(0, vec![1; 4], 1.0), false)
        .unwrap();

    assert_eq!(outcome, TransferOutcome::Accumulating { position: 4 });
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_full_block_publishes_and_triggers() {
    let (mut worker, context, rx) = single_channel_worker(10);

    let outcome = worker
        .transfer(ChannelSlice::new(0, vec![3; 10], 1.0), false)
        .unwrap();

    assert_eq!(
        outcome,
        TransferOutcome::Swapped {
            ready: ReadyOutcome::Completed { round: 1 }
        }
    );
    assert_eq!(rx.try_recv().unwrap(), RenderCommand::Render { round: 1 });

    let fronts = context.surface.write().fronts();
    assert_eq!(fronts.len(), 1);
    assert_eq!(fronts[0].samples, vec![3.0; 10]);
    assert_eq!(context.metrics.swaps(), 1);
}

#[test]
fn test_one_swap_after_fifth_frame() {
    // 10 kHz at a 0.5 s refresh
    let (mut worker, context, _rx) = single_channel_worker(5000);

    for i in 1..=4 {
        let outcome = worker
            .transfer(ChannelSlice::new(0, vec![0; 1000], 1.0), false)
            .unwrap();
        assert_eq!(outcome, TransferOutcome::Accumulating { position: i * 1000 });
    }
    assert_eq!(context.metrics.swaps(), 0);

    let outcome = worker
        .transfer(ChannelSlice::new(0, vec![0; 1000], 1.0), false)
        .unwrap();
    assert!(matches!(outcome, TransferOutcome::Swapped { .. }));
    assert_eq!(context.metrics.swaps(), 1);
    assert_eq!(worker.buffer(0).unwrap().back_position(), 0);
}

#[test]
fn test_cancelled_worker_discards_slices() {
    let (mut worker, context, _rx) = single_channel_worker(10);
    context.cancelled.store(true, Ordering::Release);

    let outcome = worker
        .transfer(ChannelSlice::new(0, vec![1; 10], 1.0), false)
        .unwrap();

    assert_eq!(outcome, TransferOutcome::Discarded);
    assert_eq!(context.metrics.snapshot().slices_discarded, 1);
    assert_eq!(worker.buffer(0).unwrap().back_position(), 0);
}

#[test]
fn test_reconfigure_finishes_current_block_first() {
    let (mut worker, _context, _rx) = single_channel_worker(10);
    worker
        .transfer(ChannelSlice::new(0, vec![1; 4], 1.0), false)
        .unwrap();

    worker.reconfigure(&settings(2.0, 10.0));
    assert_eq!(worker.buffer(0).unwrap().block_size(), 10);

    let outcome = worker
        .transfer(ChannelSlice::new(0, vec![1; 6], 1.0), false)
        .unwrap();
    assert!(matches!(outcome, TransferOutcome::Swapped { .. }));
    assert_eq!(worker.buffer(0).unwrap().front().len(), 10);
    assert_eq!(worker.buffer(0).unwrap().block_size(), 20);
}

#[test]
fn test_release_reports_owned_channels() {
    let (context, writers, _rx) = grid(3);
    let buffers = writers
        .into_iter()
        .map(|w| (ChannelBuffer::new(w.channel(), 5), w))
        .collect();
    let worker = ChannelWorker::new(0, buffers, context, FormatSettings::default());

    assert_eq!(worker.channel_count(), 3);
    assert_eq!(worker.release(), 3);
}

#[test]
fn test_concurrent_workers_swap_without_lock_waits() {
    let channels = 8;
    let (context, writers, rx) = grid(channels);
    let metrics = Arc::clone(&context.metrics);
    let assignment = OwnerAssignment::round_robin(channels, 4);

    // 100-sample blocks
    let pool = WorkerPool::spawn(
        &assignment,
        writers,
        &vec![false; channels],
        settings(1.0, 100.0),
        context,
    )
    .unwrap();
    let mut dispatcher =
        Dispatcher::new(&assignment, pool.inboxes(), vec![1.0; channels], Arc::clone(&metrics));

    for i in 0..10 {
        let columns = vec![vec![i as i16; 50]; channels];
        let frame = DataFrame::from_channels(i as f64 * 0.5, (i + 1) as f64 * 0.5, &columns).unwrap();
        assert_eq!(dispatcher.dispatch(&frame).unwrap(), channels);
    }

    let deadline = Instant::now() + Duration::from_secs(5);
    while metrics.swaps() < 40 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(metrics.swaps(), 40);
    assert_eq!(metrics.lock_waits(), 0);
    assert_eq!(metrics.ownership_violations(), 0);

    let acks = pool.shutdown().unwrap();
    assert_eq!(acks.len(), 4);
    assert_eq!(acks.iter().map(|a| a.released_channels).sum::<usize>(), channels);

    // No renderer in this grid: every round after the first finds the bits saturated
    assert_eq!(rx.try_iter().count(), 1);
}
