pub mod buffers;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod layout;
pub mod observability;
pub mod source;

pub use config::DisplayConfig;
pub use engine::{Canvas, DisplayEvent, GridSpec, LiveDisplay, OwnerAssignment};
pub use error::DisplayError;
