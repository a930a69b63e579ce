//! Usage metrics for extraction calls.
//!
//! Counts calls, tokens and failures per model and keeps a running
//! latency total. Shared across invocations; all updates go through a
//! single lock.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::providers::TokenUsage;

/// Accumulated usage for one model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelUsage {
    /// Successful calls
    pub calls: u32,

    /// Failed calls
    pub failures: u32,

    /// Prompt/input tokens
    pub prompt_tokens: u32,

    /// Completion/output tokens
    pub completion_tokens: u32,

    /// Sum of call latencies in milliseconds
    pub total_latency_ms: f64,

    /// Estimated cost in USD
    pub estimated_cost: f64,
}

impl ModelUsage {
    /// Add one successful call.
    pub fn add(&mut self, usage: &TokenUsage, model: &str, latency: Duration) {
        self.calls += 1;
        self.prompt_tokens += usage.prompt_tokens;
        self.completion_tokens += usage.completion_tokens;
        self.total_latency_ms += latency.as_secs_f64() * 1000.0;
        self.estimated_cost += Self::estimate_cost(usage, model);
    }

    pub fn total_tokens(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }

    /// Mean latency of successful calls.
    pub fn average_latency_ms(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.total_latency_ms / self.calls as f64
        }
    }

    fn estimate_cost(usage: &TokenUsage, model: &str) -> f64 {
        // USD per million tokens
        let (input_rate, output_rate) = match model {
            m if m.contains("opus") => (5.0, 25.0),
            m if m.contains("haiku") => (1.0, 5.0),
            _ => (3.0, 15.0),
        };

        (usage.prompt_tokens as f64 / 1_000_000.0) * input_rate
            + (usage.completion_tokens as f64 / 1_000_000.0) * output_rate
    }
}

/// Thread-safe collector keyed by model name.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    models: RwLock<BTreeMap<String, ModelUsage>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful call.
    pub fn record_success(&self, model: &str, usage: &TokenUsage, latency: Duration) {
        self.models
            .write()
            .entry(model.to_string())
            .or_default()
            .add(usage, model, latency);
    }

    /// Record a failed call.
    pub fn record_failure(&self, model: &str) {
        self.models
            .write()
            .entry(model.to_string())
            .or_default()
            .failures += 1;
    }

    /// Usage for one model.
    pub fn model(&self, model: &str) -> Option<ModelUsage> {
        self.models.read().get(model).cloned()
    }

    /// Snapshot of all models.
    pub fn snapshot(&self) -> BTreeMap<String, ModelUsage> {
        self.models.read().clone()
    }

    /// Usage summed over all models.
    pub fn totals(&self) -> ModelUsage {
        self.models
            .read()
            .values()
            .fold(ModelUsage::default(), |mut acc, usage| {
                acc.calls += usage.calls;
                acc.failures += usage.failures;
                acc.prompt_tokens += usage.prompt_tokens;
                acc.completion_tokens += usage.completion_tokens;
                acc.total_latency_ms += usage.total_latency_ms;
                acc.estimated_cost += usage.estimated_cost;
                acc
            })
    }

    pub fn reset(&self) {
        self.models.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(prompt: u32, completion: u32) -> TokenUsage {
        TokenUsage {
            prompt_tokens: prompt,
            completion_tokens: completion,
        }
    }

    #[test]
    fn test_record_success_and_failure() {
        let metrics = MetricsCollector::new();
        metrics.record_success("claude-sonnet-4-5", &usage(1000, 200), Duration::from_millis(100));
        metrics.record_success("claude-sonnet-4-5", &usage(500, 100), Duration::from_millis(300));
        metrics.record_failure("claude-sonnet-4-5");

        let model = metrics.model("claude-sonnet-4-5").unwrap();
        assert_eq!(model.calls, 2);
        assert_eq!(model.failures, 1);
        assert_eq!(model.total_tokens(), 1800);
        assert!((model.average_latency_ms() - 200.0).abs() < 1e-9);
        assert!(model.estimated_cost > 0.0);
    }

    #[test]
    fn test_totals_across_models() {
        let metrics = MetricsCollector::new();
        metrics.record_success("a", &usage(10, 5), Duration::from_millis(1));
        metrics.record_success("b", &usage(20, 5), Duration::from_millis(1));
        metrics.record_failure("c");

        let totals = metrics.totals();
        assert_eq!(totals.calls, 2);
        assert_eq!(totals.failures, 1);
        assert_eq!(totals.total_tokens(), 40);
        assert_eq!(metrics.snapshot().len(), 3);

        metrics.reset();
        assert!(metrics.snapshot().is_empty());
    }

    #[test]
    fn test_average_latency_without_calls() {
        assert_eq!(ModelUsage::default().average_latency_ms(), 0.0);
    }
}
