pub mod metrics;
pub mod monitor;

pub use metrics::{DisplayMetrics, MetricsSnapshot};
pub use monitor::DisplayMonitor;
