use anyhow::{anyhow, Result};
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::layout::ArrayKind;

/// Raw sample type delivered by the data server
pub type Sample = i16;

/// Basic delivery unit: one requested time window of the recording
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    /// Window start in seconds
    pub start: f64,

    /// Window end in seconds (exclusive)
    pub stop: f64,

    /// Rows are samples, columns are channels
    pub samples: Array2<Sample>,
}

impl DataFrame {
    pub fn new(start: f64, stop: f64, samples: Array2<Sample>) -> Self {
        Self {
            start,
            stop,
            samples,
        }
    }

    /// Build a frame from row-major (sample-interleaved) data
    pub fn from_interleaved(
        start: f64,
        stop: f64,
        num_channels: usize,
        data: Vec<Sample>,
    ) -> Result<Self> {
        if num_channels == 0 {
            anyhow::bail!("Frame must carry at least one channel");
        }
        if data.len() % num_channels != 0 {
            anyhow::bail!(
                "Interleaved data length {} is not a multiple of {} channels",
                data.len(),
                num_channels
            );
        }
        let rows = data.len() / num_channels;
        let samples = Array2::from_shape_vec((rows, num_channels), data)
            .map_err(|e| anyhow!("Invalid frame shape: {}", e))?;
        Ok(Self::new(start, stop, samples))
    }

    /// Build a frame from per-channel columns of equal length
    pub fn from_channels(start: f64, stop: f64, channels: &[Vec<Sample>]) -> Result<Self> {
        let rows = channels.first().map(|c| c.len()).unwrap_or(0);
        if let Some(bad) = channels.iter().position(|c| c.len() != rows) {
            anyhow::bail!(
                "Channel {} has {} samples, expected {}",
                bad,
                channels[bad].len(),
                rows
            );
        }
        let samples = Array2::from_shape_fn((rows, channels.len()), |(r, c)| channels[c][r]);
        Ok(Self::new(start, stop, samples))
    }

    pub fn num_samples(&self) -> usize {
        self.samples.nrows()
    }

    pub fn num_channels(&self) -> usize {
        self.samples.ncols()
    }

    pub fn duration(&self) -> f64 {
        self.stop - self.start
    }

    pub fn channel(&self, channel: usize) -> Option<ArrayView1<'_, Sample>> {
        (channel < self.num_channels()).then(|| self.samples.column(channel))
    }

    /// Copy one channel column out of the frame
    pub fn slice_channel(&self, channel: usize, gain: f64) -> Option<ChannelSlice> {
        self.channel(channel).map(|column| ChannelSlice {
            channel,
            samples: column.to_vec(),
            gain,
        })
    }
}

/// Samples for exactly one channel, moved from the dispatcher to the owning worker
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSlice {
    pub channel: usize,
    pub samples: Vec<Sample>,
    pub gain: f64,
}

impl ChannelSlice {
    pub fn new(channel: usize, samples: Vec<Sample>, gain: f64) -> Self {
        Self {
            channel,
            samples,
            gain,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Static description of a source, fetched once at connection time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    pub channel_count: usize,
    pub sample_rate: f64,
    /// Per-channel gain applied to raw samples before display
    pub gains: Vec<f64>,
    /// Array/topology identifier, e.g. "mcs" or "hidens-2011"
    pub array: String,
}

impl SourceMetadata {
    pub fn gain(&self, channel: usize) -> f64 {
        self.gains.get(channel).copied().unwrap_or(1.0)
    }

    pub fn array_kind(&self) -> ArrayKind {
        ArrayKind::from_name(&self.array)
    }
}
