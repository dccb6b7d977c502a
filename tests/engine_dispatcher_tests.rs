use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver};
use meaview::core::DataFrame;
use meaview::engine::{Dispatcher, OwnerAssignment, WorkerMessage};
use meaview::observability::DisplayMetrics;
use meaview::DisplayError;

fn dispatcher(
    assignment: &OwnerAssignment,
    gains: Vec<f64>,
) -> (Dispatcher, Vec<Receiver<WorkerMessage>>, Arc<DisplayMetrics>) {
    let (senders, receivers): (Vec<_>, Vec<_>) =
        (0..assignment.worker_count()).map(|_| unbounded()).unzip();
    let metrics = Arc::new(DisplayMetrics::new());
    (
        Dispatcher::new(assignment, senders, gains, Arc::clone(&metrics)),
        receivers,
        metrics,
    )
}

fn transfers(inbox: &Receiver<WorkerMessage>) -> Vec<(usize, Vec<i16>, f64)> {
    inbox
        .try_iter()
        .filter_map(|message| match message {
            WorkerMessage::Transfer { slice, .. } => Some((slice.channel, slice.samples, slice.gain)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_slices_reach_owning_worker() {
    let assignment = OwnerAssignment::from_owners(vec![1, 0, 1], 2).unwrap();
    let (mut dispatcher, inboxes, metrics) = dispatcher(&assignment, vec![1.0, 2.0, 0.5]);

    let frame = DataFrame::from_interleaved(0.0, 0.1, 3, vec![1, 2, 3, 4, 5, 6]).unwrap();
    assert_eq!(dispatcher.dispatch(&frame).unwrap(), 3);

    assert_eq!(transfers(&inboxes[0]), vec![(1, vec![2, 5], 2.0)]);
    assert_eq!(
        transfers(&inboxes[1]),
        vec![(0, vec![1, 4], 1.0), (2, vec![3, 6], 0.5)]
    );
    assert_eq!(metrics.frames_dispatched(), 1);
}

#[test]
fn test_slices_keep_frame_order_per_channel() {
    let assignment = OwnerAssignment::round_robin(1, 1);
    let (mut dispatcher, inboxes, _metrics) = dispatcher(&assignment, vec![1.0]);

    for i in 0..3 {
        let frame = DataFrame::from_channels(i as f64, i as f64 + 1.0, &[vec![i as i16; 2]]).unwrap();
        dispatcher.dispatch(&frame).unwrap();
    }

    let samples: Vec<Vec<i16>> = transfers(&inboxes[0]).into_iter().map(|t| t.1).collect();
    assert_eq!(samples, vec![vec![0, 0], vec![1, 1], vec![2, 2]]);
}

#[test]
fn test_extra_source_channels_are_ignored() {
    let assignment = OwnerAssignment::round_robin(2, 1);
    let (mut dispatcher, inboxes, _metrics) = dispatcher(&assignment, vec![1.0, 1.0]);

    let frame = DataFrame::from_interleaved(0.0, 0.1, 4, vec![0; 8]).unwrap();
    assert_eq!(dispatcher.dispatch(&frame).unwrap(), 2);
    assert_eq!(transfers(&inboxes[0]).len(), 2);
}

#[test]
fn test_stopped_dispatcher_rejects_frames() {
    let assignment = OwnerAssignment::round_robin(1, 1);
    let (mut dispatcher, inboxes, metrics) = dispatcher(&assignment, vec![1.0]);
    dispatcher.stop_accepting();

    let frame = DataFrame::from_channels(0.0, 0.1, &[vec![1; 4]]).unwrap();
    assert_eq!(dispatcher.dispatch(&frame), Err(DisplayError::NotRunning));
    assert!(inboxes[0].try_recv().is_err());
    assert_eq!(metrics.snapshot().frames_rejected, 1);
}

#[test]
fn test_selection_travels_with_slice() {
    let assignment = OwnerAssignment::round_robin(2, 1);
    let (mut dispatcher, inboxes, _metrics) = dispatcher(&assignment, vec![1.0, 1.0]);
    assert_eq!(dispatcher.toggle_selected(1), Some(true));
    assert!(dispatcher.is_selected(1));

    let frame = DataFrame::from_interleaved(0.0, 0.1, 2, vec![0; 4]).unwrap();
    dispatcher.dispatch(&frame).unwrap();

    let selected: Vec<bool> = inboxes[0]
        .try_iter()
        .filter_map(|message| match message {
            WorkerMessage::Transfer { selected, .. } => Some(selected),
            _ => None,
        })
        .collect();
    assert_eq!(selected, vec![false, true]);
}
