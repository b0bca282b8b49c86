pub mod metrics;
pub mod tracing;

pub use metrics::{MetricsRegistry, MetricsSnapshot, TimingGuard};
pub use tracing::init_tracing;
