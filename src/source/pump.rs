use std::time::Duration;

use anyhow::Result;
use log::{debug, info};
use tokio::sync::broadcast;

use super::FrameSource;
use crate::core::DataFrame;
use crate::engine::LiveDisplay;
use crate::error::DisplayError;

/// Requests consecutive windows from a source starting at the play
/// position and hands every frame to a sink.
///
/// The position is kept as a sample index so windows tile exactly.
pub struct StreamPump<S: FrameSource> {
    source: S,
    sample_rate: f64,
    chunk_samples: usize,
    position: u64,
}

impl<S: FrameSource> StreamPump<S> {
    pub fn new(source: S, sample_rate: f64, chunk_samples: usize) -> Self {
        Self {
            source,
            sample_rate,
            chunk_samples: chunk_samples.max(1),
            position: 0,
        }
    }

    /// Play position in seconds
    pub fn position(&self) -> f64 {
        self.position as f64 / self.sample_rate
    }

    pub fn seek(&mut self, seconds: f64) {
        self.position = (seconds.max(0.0) * self.sample_rate).round() as u64;
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Fetch the window at the play position and advance past it
    pub async fn next_frame(&mut self) -> Result<DataFrame> {
        let end = self.position + self.chunk_samples as u64;
        let start = self.position as f64 / self.sample_rate;
        let stop = end as f64 / self.sample_rate;
        let frame = self.source.fetch(start, stop).await?;
        self.position = end;
        Ok(frame)
    }

    /// Pump frames into `sink` until shutdown is signalled, the sink
    /// returns `false`, or `max_frames` frames were delivered. `pace` is
    /// slept between frames. Returns the number of frames delivered.
    pub async fn run<F>(
        &mut self,
        mut sink: F,
        mut shutdown: broadcast::Receiver<()>,
        pace: Option<Duration>,
        max_frames: Option<usize>,
    ) -> Result<usize>
    where
        F: FnMut(DataFrame) -> Result<bool>,
    {
        let mut delivered = 0;
        loop {
            if max_frames.map_or(false, |max| delivered >= max) {
                break;
            }

            let frame = tokio::select! {
                _ = shutdown.recv() => break,
                frame = self.next_frame() => frame?,
            };

            if !sink(frame)? {
                info!("Display stopped accepting frames at {:.3}s", self.position());
                break;
            }
            delivered += 1;

            if let Some(pace) = pace {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    _ = tokio::time::sleep(pace) => {}
                }
            }
        }
        debug!("Pump stopped at {:.3}s after {} frames", self.position(), delivered);
        Ok(delivered)
    }
}

/// Sink feeding a display; reports `false` once the display refuses frames
pub fn display_sink(display: &mut LiveDisplay) -> impl FnMut(DataFrame) -> Result<bool> + '_ {
    move |frame| match display.submit_frame(frame) {
        Ok(_) => Ok(true),
        Err(e) => match e.downcast_ref::<DisplayError>() {
            Some(DisplayError::NotRunning) => Ok(false),
            _ => Err(e),
        },
    }
}
