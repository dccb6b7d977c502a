use std::sync::Arc;

use crossbeam_channel::Sender;
use log::{debug, warn};

use super::assignment::{OwnerAssignment, WorkerId};
use super::worker::WorkerMessage;
use crate::core::DataFrame;
use crate::error::DisplayError;
use crate::observability::DisplayMetrics;

/// Splits frames by channel and hands each slice to its owning worker.
///
/// Frames are sliced and sent one after another from the caller's thread
/// and every worker inbox is FIFO, so slices of one channel are applied in
/// frame-arrival order.
pub struct Dispatcher {
    routes: Vec<WorkerId>,
    inboxes: Vec<Sender<WorkerMessage>>,
    gains: Vec<f64>,
    selected: Vec<bool>,
    accepting: bool,
    last_stop: Option<f64>,
    metrics: Arc<DisplayMetrics>,
}

impl Dispatcher {
    pub fn new(
        assignment: &OwnerAssignment,
        inboxes: Vec<Sender<WorkerMessage>>,
        gains: Vec<f64>,
        metrics: Arc<DisplayMetrics>,
    ) -> Self {
        let channels = assignment.channel_count();
        Self {
            routes: assignment.owners().to_vec(),
            inboxes,
            gains,
            selected: vec![false; channels],
            accepting: true,
            last_stop: None,
            metrics,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.routes.len()
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    /// Refuse every later frame
    pub fn stop_accepting(&mut self) {
        self.accepting = false;
    }

    pub fn is_selected(&self, channel: usize) -> bool {
        self.selected.get(channel).copied().unwrap_or(false)
    }

    /// Flip the highlight state of a channel; returns the new state
    pub fn toggle_selected(&mut self, channel: usize) -> Option<bool> {
        let entry = self.selected.get_mut(channel)?;
        *entry = !*entry;
        Some(*entry)
    }

    /// Slice `frame` and queue one transfer per registered channel.
    /// Never blocks. Returns the number of slices sent.
    pub fn dispatch(&mut self, frame: &DataFrame) -> Result<usize, DisplayError> {
        if !self.accepting {
            self.metrics.record_frame_rejected();
            return Err(DisplayError::NotRunning);
        }
        let expected = self.routes.len();
        if frame.num_channels() < expected {
            self.metrics.record_frame_rejected();
            return Err(DisplayError::ChannelCountMismatch {
                expected,
                actual: frame.num_channels(),
            });
        }
        if let Some(last) = self.last_stop {
            if frame.start < last {
                debug!(
                    "Frame starting at {:.3}s overlaps previous frame ending at {:.3}s",
                    frame.start, last
                );
            }
        }
        self.last_stop = Some(frame.stop);

        let mut sent = 0;
        for (channel, &worker) in self.routes.iter().enumerate() {
            let gain = self.gains.get(channel).copied().unwrap_or(1.0);
            let Some(slice) = frame.slice_channel(channel, gain) else {
                continue;
            };
            let Some(inbox) = self.inboxes.get(worker) else {
                warn!("Channel {} routed to missing worker {}", channel, worker);
                continue;
            };
            let message = WorkerMessage::Transfer {
                slice,
                selected: self.selected[channel],
            };
            if inbox.send(message).is_err() {
                warn!("Worker {} inbox closed, channel {} slice dropped", worker, channel);
                continue;
            }
            sent += 1;
        }

        self.metrics.record_frame_dispatched();
        Ok(sent)
    }
}
