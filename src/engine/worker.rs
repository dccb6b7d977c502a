use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use log::{debug, warn};

use super::assignment::WorkerId;
use super::barrier::{ReadyOutcome, SyncBarrier};
use super::surface::{FrontWriter, SharedSurface};
use crate::buffers::{ChannelBuffer, FormatSettings};
use crate::core::ChannelSlice;
use crate::error::DisplayError;
use crate::observability::DisplayMetrics;

/// Settings pushed to every worker when the host changes them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkerSettings {
    pub refresh_interval: f64,
    pub sample_rate: f64,
    pub format: FormatSettings,
}

#[derive(Debug)]
pub enum WorkerMessage {
    Transfer { slice: ChannelSlice, selected: bool },
    Reconfigure(WorkerSettings),
    /// Release every buffer and confirm on `ack`
    Shutdown { ack: Sender<WorkerAck> },
}

/// Confirmation that a worker dropped all of its buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerAck {
    pub worker: WorkerId,
    pub released_channels: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    Accumulating { position: usize },
    Swapped { ready: ReadyOutcome },
    /// Grid is being torn down; the slice was dropped unread
    Discarded,
}

/// Shared handles every worker of one grid generation needs
#[derive(Clone)]
pub struct WorkerContext {
    pub surface: Arc<SharedSurface>,
    pub barrier: Arc<SyncBarrier>,
    pub metrics: Arc<DisplayMetrics>,
    /// Set before shutdown so queued slices are dropped instead of swapped
    pub cancelled: Arc<AtomicBool>,
}

struct OwnedChannel {
    buffer: ChannelBuffer,
    writer: FrontWriter,
}

/// Transfer worker owning a disjoint set of channel buffers
pub struct ChannelWorker {
    id: WorkerId,
    channels: BTreeMap<usize, OwnedChannel>,
    context: WorkerContext,
    format: FormatSettings,
}

impl ChannelWorker {
    pub fn new(
        id: WorkerId,
        buffers: Vec<(ChannelBuffer, FrontWriter)>,
        context: WorkerContext,
        format: FormatSettings,
    ) -> Self {
        let channels = buffers
            .into_iter()
            .map(|(buffer, writer)| (buffer.channel(), OwnedChannel { buffer, writer }))
            .collect();
        Self {
            id,
            channels,
            context,
            format,
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn owns(&self, channel: usize) -> bool {
        self.channels.contains_key(&channel)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn buffer(&self, channel: usize) -> Option<&ChannelBuffer> {
        self.channels.get(&channel).map(|owned| &owned.buffer)
    }

    /// Append a slice to its channel and swap once a block is complete
    pub fn transfer(
        &mut self,
        slice: ChannelSlice,
        selected: bool,
    ) -> Result<TransferOutcome, DisplayError> {
        if self.context.cancelled.load(Ordering::Acquire) {
            self.context.metrics.record_slice_discarded();
            return Ok(TransferOutcome::Discarded);
        }

        let Some(owned) = self.channels.get_mut(&slice.channel) else {
            self.context.metrics.record_ownership_violation();
            return Err(DisplayError::OwnershipViolation {
                channel: slice.channel,
                worker: self.id,
            });
        };

        if owned.buffer.append(&slice.samples, slice.gain) {
            self.context.metrics.record_buffer_growth();
        }
        self.context.metrics.record_slice_transferred();
        drop(slice);

        if !owned.buffer.is_full() {
            return Ok(TransferOutcome::Accumulating {
                position: owned.buffer.back_position(),
            });
        }

        let context = &self.context;
        let guard = match context.surface.try_read() {
            Some(guard) => guard,
            None => {
                context.metrics.record_lock_wait();
                context.surface.read()
            }
        };
        let previous = owned.buffer.swap_and_trim(&self.format, selected);
        let replaced = guard.publish(&mut owned.writer, Arc::clone(owned.buffer.front()));
        let ready = context.barrier.mark_ready(owned.buffer.channel(), &guard);
        drop(guard);

        drop(replaced);
        drop(previous);
        context.metrics.record_swap();
        Ok(TransferOutcome::Swapped { ready })
    }

    pub fn reconfigure(&mut self, settings: &WorkerSettings) {
        self.format = settings.format;
        for owned in self.channels.values_mut() {
            owned
                .buffer
                .recompute_block_size(settings.refresh_interval, settings.sample_rate);
        }
    }

    /// Drop every buffer without swapping; returns how many were released
    pub fn release(mut self) -> usize {
        let released = self.channels.len();
        for owned in self.channels.values_mut() {
            owned.buffer.discard();
        }
        self.channels.clear();
        released
    }

    /// Sequential task loop; slices are applied strictly in arrival order
    pub fn run(mut self, inbox: Receiver<WorkerMessage>) {
        debug!(
            "Worker {} started with {} channels",
            self.id,
            self.channels.len()
        );
        while let Ok(message) = inbox.recv() {
            match message {
                WorkerMessage::Transfer { slice, selected } => {
                    if let Err(e) = self.transfer(slice, selected) {
                        warn!("Worker {} dropped slice: {}", self.id, e);
                    }
                }
                WorkerMessage::Reconfigure(settings) => self.reconfigure(&settings),
                WorkerMessage::Shutdown { ack } => {
                    let worker = self.id;
                    let released_channels = self.release();
                    let _ = ack.send(WorkerAck {
                        worker,
                        released_channels,
                    });
                    return;
                }
            }
        }
        debug!("Worker {} inbox closed", self.id);
    }
}
