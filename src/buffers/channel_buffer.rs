use std::sync::Arc;

use log::debug;

use super::format::{mean, FormatSettings, PlotFormat};
use crate::config;
use crate::core::Sample;

/// One completed block, as shown by the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct FrontBlock {
    pub channel: usize,
    /// Number of swaps this channel has performed, starting at 1
    pub sequence: u64,
    pub samples: Vec<f64>,
    pub format: PlotFormat,
}

impl FrontBlock {
    pub fn empty(channel: usize) -> Self {
        Self {
            channel,
            sequence: 0,
            samples: Vec::new(),
            format: PlotFormat::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Per-channel double buffer.
///
/// Samples accumulate in `back` until `block_size` is reached; the swap
/// then moves the block into a new front handle without copying it.
/// Samples past `block_size` are dropped, never carried into the next block.
#[derive(Debug)]
pub struct ChannelBuffer {
    channel: usize,
    back: Vec<f64>,
    back_position: usize,
    front: Arc<FrontBlock>,
    block_size: usize,
    /// Block size to adopt at the next block boundary
    pending_block_size: Option<usize>,
    /// Mean of the current front block; only kept for channels that are
    /// not autoscaled
    running_mean: Option<f64>,
    always_autoscale: bool,
    swaps: u64,
}

impl ChannelBuffer {
    pub fn new(channel: usize, block_size: usize) -> Self {
        let block_size = block_size.max(1);
        Self {
            channel,
            back: Vec::with_capacity(block_size),
            back_position: 0,
            front: Arc::new(FrontBlock::empty(channel)),
            block_size,
            pending_block_size: None,
            running_mean: None,
            always_autoscale: false,
            swaps: 0,
        }
    }

    /// Channel whose axis is fitted to its data regardless of the global setting
    pub fn with_autoscale(mut self, always_autoscale: bool) -> Self {
        self.always_autoscale = always_autoscale;
        self
    }

    pub fn channel(&self) -> usize {
        self.channel
    }

    pub fn back_position(&self) -> usize {
        self.back_position
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn pending_block_size(&self) -> Option<usize> {
        self.pending_block_size
    }

    pub fn front(&self) -> &Arc<FrontBlock> {
        &self.front
    }

    pub fn running_mean(&self) -> Option<f64> {
        self.running_mean
    }

    pub fn swaps(&self) -> u64 {
        self.swaps
    }

    pub fn always_autoscale(&self) -> bool {
        self.always_autoscale
    }

    /// Scale by `gain` and append at `back_position`.
    ///
    /// Grows the back buffer when the slice does not fit; returns true if
    /// it had to.
    pub fn append(&mut self, samples: &[Sample], gain: f64) -> bool {
        let needed = self.back_position + samples.len();
        let grew = needed > self.back.capacity();
        if grew {
            debug!(
                "Channel {} back buffer grows from {} to {} samples",
                self.channel,
                self.back.capacity(),
                needed
            );
            self.back.reserve(needed - self.back.len());
        }
        self.back
            .extend(samples.iter().map(|&sample| f64::from(sample) * gain));
        self.back_position = needed;
        grew
    }

    pub fn is_full(&self) -> bool {
        self.back_position >= self.block_size
    }

    /// Trim the back buffer to `block_size`, make it the new front and
    /// return the previous front for disposal by the caller.
    pub fn swap_and_trim(&mut self, settings: &FormatSettings, selected: bool) -> Arc<FrontBlock> {
        self.back.truncate(self.block_size);
        let samples = std::mem::replace(&mut self.back, Vec::with_capacity(self.block_size));

        let format = if settings.autoscale || self.always_autoscale {
            self.running_mean = None;
            PlotFormat::autoscaled(&samples, settings.scale_multiplier, selected)
        } else {
            let block_mean = mean(&samples);
            self.running_mean = Some(block_mean);
            PlotFormat::centered(block_mean, settings, selected)
        };

        self.swaps += 1;
        let block = Arc::new(FrontBlock {
            channel: self.channel,
            sequence: self.swaps,
            samples,
            format,
        });

        self.back_position = 0;
        if let Some(size) = self.pending_block_size.take() {
            self.adopt_block_size(size);
        }
        std::mem::replace(&mut self.front, block)
    }

    /// Derive the block size from refresh interval and sample rate. A block
    /// in progress is finished at the old size.
    pub fn recompute_block_size(&mut self, refresh_interval: f64, sample_rate: f64) {
        let size = config::block_size(refresh_interval, sample_rate);
        if self.back_position == 0 {
            self.pending_block_size = None;
            self.adopt_block_size(size);
        } else if size != self.block_size {
            self.pending_block_size = Some(size);
        } else {
            self.pending_block_size = None;
        }
    }

    fn adopt_block_size(&mut self, size: usize) {
        self.block_size = size;
        if self.back.capacity() < size {
            self.back.reserve(size - self.back.len());
        }
    }

    /// Drop accumulated samples without swapping
    pub fn discard(&mut self) {
        self.back.clear();
        self.back_position = 0;
    }
}
