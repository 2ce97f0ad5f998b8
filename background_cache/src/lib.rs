//! Background refresh for cached objects
//!
//! [`BackgroundCacheManager`] learns which objects are in use from the
//! cached notifications producers raise, and periodically asks each producer
//! to rebuild the ones about to expire.

pub mod manager;
pub mod prelude;
pub mod registry;
pub mod scheduler;


pub use manager::{BackgroundCacheManager, DEFAULT_PERIOD_MINUTES, SweepReport};
pub use registry::{Registry, TrackOutcome};
