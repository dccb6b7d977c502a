use thiserror::Error;

/// Failure kinds of the transfer-and-render core.
///
/// None of these are fatal: callers log them and skip the slice, frame or
/// render cycle they belong to.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DisplayError {
    #[error("channel {channel} is not owned by worker {worker}")]
    OwnershipViolation { channel: usize, worker: usize },
    #[error("render failed: {0}")]
    RenderFailed(String),
    #[error("display is not accepting frames")]
    NotRunning,
    #[error("channel count mismatch: expected {expected}, got {actual}")]
    ChannelCountMismatch { expected: usize, actual: usize },
    #[error("invalid owner assignment: {0}")]
    InvalidAssignment(String),
    #[error("invalid display configuration: {0}")]
    InvalidConfig(String),
}
