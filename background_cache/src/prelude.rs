//! Convenience re-exports for common background-cache usage

pub use crate::manager::{BackgroundCacheManager, DEFAULT_PERIOD_MINUTES, SweepReport};
pub use crate::registry::{Registry, TrackOutcome};

pub use tokio_util::sync::CancellationToken;
