pub mod dataframe;

pub use dataframe::{ChannelSlice, DataFrame, Sample, SourceMetadata};
