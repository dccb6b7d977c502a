use std::f64::consts::PI;

use anyhow::{bail, Result};
use async_trait::async_trait;
use ndarray::Array2;
use serde_json::Value;

use super::FrameSource;
use crate::core::{DataFrame, Sample, SourceMetadata};

/// Deterministic multi-channel recording: channel c carries a sinusoid at
/// `base_frequency * (c + 1)` Hz. The same window always yields the same
/// samples.
pub struct SimulatedSource {
    channel_count: usize,
    sample_rate: f64,
    gain: f64,
    amplitude: f64,
    base_frequency: f64,
    array: String,
    fetches: u64,
}

impl SimulatedSource {
    pub fn new(channel_count: usize, sample_rate: f64) -> Self {
        Self {
            channel_count,
            sample_rate,
            gain: 1.0,
            amplitude: 1000.0,
            base_frequency: 1.0,
            array: "mcs".to_string(),
            fetches: 0,
        }
    }

    /// Override settings from JSON; unknown keys are ignored
    pub fn configure(&mut self, config: &Value) -> Result<()> {
        if let Some(channels) = config["channels"].as_u64() {
            self.channel_count = channels as usize;
        }
        if let Some(rate) = config["sample_rate"].as_f64() {
            if rate <= 0.0 {
                bail!("Sample rate must be positive, got {}", rate);
            }
            self.sample_rate = rate;
        }
        if let Some(gain) = config["gain"].as_f64() {
            self.gain = gain;
        }
        if let Some(amplitude) = config["amplitude"].as_f64() {
            self.amplitude = amplitude.clamp(0.0, Sample::MAX as f64);
        }
        if let Some(freq) = config["frequency"].as_f64() {
            self.base_frequency = freq;
        }
        if let Some(array) = config["array"].as_str() {
            self.array = array.to_string();
        }
        Ok(())
    }

    pub fn with_array(mut self, array: &str) -> Self {
        self.array = array.to_string();
        self
    }

    pub fn with_gain(mut self, gain: f64) -> Self {
        self.gain = gain;
        self
    }

    /// Number of windows served so far
    pub fn fetches(&self) -> u64 {
        self.fetches
    }

    fn sample_at(&self, index: u64, channel: usize) -> Sample {
        let t = index as f64 / self.sample_rate;
        let freq = self.base_frequency * (channel + 1) as f64;
        (self.amplitude * (2.0 * PI * freq * t).sin()).round() as Sample
    }
}

#[async_trait]
impl FrameSource for SimulatedSource {
    async fn metadata(&mut self) -> Result<SourceMetadata> {
        Ok(SourceMetadata {
            channel_count: self.channel_count,
            sample_rate: self.sample_rate,
            gains: vec![self.gain; self.channel_count],
            array: self.array.clone(),
        })
    }

    async fn fetch(&mut self, start: f64, stop: f64) -> Result<DataFrame> {
        if start < 0.0 || stop < start {
            bail!("Invalid window [{}, {})", start, stop);
        }
        let first = (start * self.sample_rate).round() as u64;
        let last = (stop * self.sample_rate).round() as u64;
        let rows = (last - first) as usize;

        let samples = Array2::from_shape_fn((rows, self.channel_count), |(r, c)| {
            self.sample_at(first + r as u64, c)
        });
        self.fetches += 1;
        Ok(DataFrame::new(start, stop, samples))
    }
}
