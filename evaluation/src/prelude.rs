//! Convenience re-exports for common evaluation usage

pub use crate::context::EventContext;
pub use crate::errors::EvaluationError;
pub use crate::fan_out::{ConcurrentFanOutEvaluator, FanOutResult};
pub use crate::strategy::{AsyncEvaluationStrategy, EvaluationStrategy, SingleFlagEvaluator};
