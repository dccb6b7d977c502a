use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::buffers::FormatSettings;
use crate::engine::assignment::default_worker_count;
use crate::error::DisplayError;
use crate::layout::ArrayKind;

/// Default plot refresh interval in seconds
pub const DEFAULT_REFRESH_INTERVAL: f64 = 2.0;
pub const MIN_REFRESH_INTERVAL: f64 = 0.5;
pub const MAX_REFRESH_INTERVAL: f64 = 10.0;
pub const REFRESH_STEP: f64 = 0.5;

/// Size of the windows requested from the source, in milliseconds
pub const DEFAULT_CHUNK_MS: u64 = 100;

/// Upper bound on samples per channel block (10 s at 1 MHz)
pub const MAX_BLOCK_SIZE: usize = 10_000_000;

/// Display settings shared by the dispatcher, workers and source pump
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Seconds of data shown per refresh
    pub refresh_interval: f64,
    /// Samples per second per channel
    pub sample_rate: f64,
    /// Scale every channel to fit its own data
    pub autoscale: bool,
    /// Half-range of the value axis for channels that are not autoscaled
    pub scale: f64,
    /// 1.0 for volts, 1e-6 for microvolts
    pub scale_multiplier: f64,
    /// Transfer worker count; defaults to one less than the core count
    pub worker_threads: Option<usize>,
    pub chunk_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self::for_array(ArrayKind::Mcs)
    }
}

impl DisplayConfig {
    pub fn for_array(kind: ArrayKind) -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            sample_rate: kind.default_sample_rate(),
            autoscale: false,
            scale: kind.default_display_range(),
            scale_multiplier: kind.scale_multiplier(),
            worker_threads: None,
            chunk_ms: DEFAULT_CHUNK_MS,
        }
    }

    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(config: Value) -> Result<Self> {
        let mut parsed: DisplayConfig = serde_json::from_value(config)?;
        parsed.validate()?;
        parsed.refresh_interval = clamp_refresh_interval(parsed.refresh_interval);
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<(), DisplayError> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(DisplayError::InvalidConfig(format!(
                "sample rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if !self.refresh_interval.is_finite() || self.refresh_interval <= 0.0 {
            return Err(DisplayError::InvalidConfig(format!(
                "refresh interval must be positive, got {}",
                self.refresh_interval
            )));
        }
        if !(self.scale.is_finite() && self.scale >= 0.0) {
            return Err(DisplayError::InvalidConfig(format!(
                "scale must be non-negative, got {}",
                self.scale
            )));
        }
        if !(self.scale_multiplier.is_finite() && self.scale_multiplier > 0.0) {
            return Err(DisplayError::InvalidConfig(format!(
                "scale multiplier must be positive, got {}",
                self.scale_multiplier
            )));
        }
        let samples = self.refresh_interval * self.sample_rate;
        if samples > MAX_BLOCK_SIZE as f64 {
            return Err(DisplayError::InvalidConfig(format!(
                "{} s at {} Hz needs {} samples per block, at most {} allowed",
                self.refresh_interval, self.sample_rate, samples, MAX_BLOCK_SIZE
            )));
        }
        if self.worker_threads == Some(0) {
            return Err(DisplayError::InvalidConfig(
                "worker_threads must be at least 1".to_string(),
            ));
        }
        if self.chunk_ms == 0 {
            return Err(DisplayError::InvalidConfig(
                "chunk_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn block_size(&self) -> usize {
        block_size(self.refresh_interval, self.sample_rate)
    }

    pub fn worker_count(&self) -> usize {
        self.worker_threads.unwrap_or_else(default_worker_count)
    }

    pub fn format_settings(&self) -> FormatSettings {
        FormatSettings {
            autoscale: self.autoscale,
            scale: self.scale,
            scale_multiplier: self.scale_multiplier,
        }
    }

    /// Samples per channel in one source request
    pub fn chunk_samples(&self) -> usize {
        ((self.chunk_ms as f64 / 1000.0) * self.sample_rate).round().max(1.0) as usize
    }
}

/// Samples that must accumulate before a channel swaps
pub fn block_size(refresh_interval: f64, sample_rate: f64) -> usize {
    ((refresh_interval * sample_rate).round() as usize).max(1)
}

/// Clamp to the supported range and snap to the refresh step. NaN maps to
/// the default interval.
pub fn clamp_refresh_interval(seconds: f64) -> f64 {
    if seconds.is_nan() {
        return DEFAULT_REFRESH_INTERVAL;
    }
    let clamped = seconds.clamp(MIN_REFRESH_INTERVAL, MAX_REFRESH_INTERVAL);
    (clamped / REFRESH_STEP).round() * REFRESH_STEP
}
