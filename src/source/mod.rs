//! Where frames come from. The display core never talks to a data server
//! itself; a [`FrameSource`] is polled by a [`StreamPump`] which hands each
//! frame to the display.

pub mod pump;
pub mod simulated;

use anyhow::Result;
use async_trait::async_trait;

use crate::core::{DataFrame, SourceMetadata};

pub use pump::{display_sink, StreamPump};
pub use simulated::SimulatedSource;

#[async_trait]
pub trait FrameSource: Send {
    /// Channel count, rate, gains and array type. Queried once per grid.
    async fn metadata(&mut self) -> Result<SourceMetadata>;

    /// All channels for the window [start, stop) in seconds
    async fn fetch(&mut self, start: f64, stop: f64) -> Result<DataFrame>;
}
