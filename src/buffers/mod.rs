pub mod channel_buffer;
pub mod format;

pub use channel_buffer::{ChannelBuffer, FrontBlock};
pub use format::{AxisTicks, FormatSettings, PlotFormat};
