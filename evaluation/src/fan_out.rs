//! Concurrent fan-out evaluation
//!
//! Every key of a batch runs on its own tokio task. Results and timings are
//! collected in concurrent maps and only handed back once every task has
//! finished; a failing key fails the batch.

use crate::context::EventContext;
use crate::errors::EvaluationError;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Suffix of the telemetry property carrying a key's elapsed milliseconds
pub const TIME_TAKEN_SUFFIX: &str = ":TimeTaken";

/// Aggregated outcome of a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutResult {
    pub results: HashMap<String, bool>,
    /// Elapsed evaluation time per key, in whole milliseconds
    pub timings: HashMap<String, u64>,
}

/// Evaluates independent keys in parallel and joins before returning
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcurrentFanOutEvaluator;

impl ConcurrentFanOutEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate every distinct key concurrently.
    ///
    /// Duplicate keys are evaluated once (first occurrence wins). On success
    /// `key -> result` and `key:TimeTaken -> ms` are attached to `context`.
    /// If any key fails, all keys still run to completion and the first
    /// observed failure is returned.
    pub async fn evaluate<I, K, F, Fut>(
        &self,
        keys: I,
        context: &EventContext,
        evaluate: F,
    ) -> Result<FanOutResult, EvaluationError>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
        F: Fn(String) -> Fut,
        Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
    {
        let results: Arc<DashMap<String, bool>> = Arc::new(DashMap::new());
        let timings: Arc<DashMap<String, u64>> = Arc::new(DashMap::new());
        let mut tasks = JoinSet::new();
        let mut task_keys = HashMap::new();
        let mut seen = HashSet::new();

        for key in keys {
            let key: String = key.into();
            if !seen.insert(key.clone()) {
                continue;
            }

            let evaluation = evaluate(key.clone());
            let results = Arc::clone(&results);
            let timings = Arc::clone(&timings);
            let task_key = key.clone();

            let handle = tasks.spawn(async move {
                let started_at = Instant::now();
                let outcome = evaluation.await;
                let elapsed_ms =
                    u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);

                match outcome {
                    Ok(enabled) => {
                        results.entry(task_key.clone()).or_insert(enabled);
                        timings.entry(task_key).or_insert(elapsed_ms);
                        Ok(())
                    }
                    Err(source) => Err(EvaluationError::Evaluation {
                        key: task_key,
                        source,
                    }),
                }
            });
            task_keys.insert(handle.id(), key);
        }

        let mut first_error = None;
        while let Some(joined) = tasks.join_next_with_id().await {
            let failure = match joined {
                Ok((_, Ok(()))) => continue,
                Ok((_, Err(error))) => error,
                Err(join_error) => EvaluationError::Panicked {
                    key: task_keys.remove(&join_error.id()).unwrap_or_default(),
                },
            };
            tracing::debug!(key = failure.key(), error = %failure, "fan-out evaluation failed");
            first_error.get_or_insert(failure);
        }

        if let Some(error) = first_error {
            return Err(error);
        }

        let results: HashMap<String, bool> = results
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        let timings: HashMap<String, u64> = timings
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();

        context.add_properties(
            results
                .iter()
                .map(|(key, enabled)| (key.clone(), enabled.to_string()))
                .chain(timings.iter().map(|(key, elapsed_ms)| {
                    (format!("{key}{TIME_TAKEN_SUFFIX}"), elapsed_ms.to_string())
                })),
        );

        Ok(FanOutResult { results, timings })
    }
}
