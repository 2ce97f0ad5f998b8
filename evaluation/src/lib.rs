//! Concurrent flag evaluation
//!
//! This crate fans a batch of independent keys out over tokio tasks, joins
//! them, and records per-key results and timings on the telemetry context.

pub mod context;
pub mod errors;
pub mod fan_out;
pub mod prelude;
pub mod strategy;

pub use context::EventContext;
pub use errors::EvaluationError;
pub use fan_out::{ConcurrentFanOutEvaluator, FanOutResult, TIME_TAKEN_SUFFIX};
pub use strategy::{AsyncEvaluationStrategy, EvaluationStrategy, SingleFlagEvaluator};
