//! Token usage and cost accounting types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token usage statistics for a single model call.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, derive_getters::Getters,
)]
pub struct TokenUsage {
    /// Tokens in the prompt/input.
    prompt_tokens: usize,
    /// Tokens in the response/output.
    completion_tokens: usize,
    /// Total tokens (prompt + completion).
    total_tokens: usize,
}

impl TokenUsage {
    /// Create a new token usage record.
    pub fn new(prompt_tokens: usize, completion_tokens: usize) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Calculate cost in USD based on pricing per million tokens.
    ///
    /// # Arguments
    ///
    /// * `prompt_price_per_million` - Cost per million prompt tokens in USD
    /// * `completion_price_per_million` - Cost per million completion tokens in USD
    ///
    /// # Examples
    ///
    /// ```
    /// use vasari_core::TokenUsage;
    ///
    /// let usage = TokenUsage::new(1_000_000, 500_000);
    /// let cost = usage.calculate_cost(1.0, 2.0);
    /// assert!((cost - 2.0).abs() < 0.001);
    /// ```
    pub fn calculate_cost(
        &self,
        prompt_price_per_million: f64,
        completion_price_per_million: f64,
    ) -> f64 {
        let prompt_cost = (self.prompt_tokens as f64 / 1_000_000.0) * prompt_price_per_million;
        let completion_cost =
            (self.completion_tokens as f64 / 1_000_000.0) * completion_price_per_million;
        prompt_cost + completion_cost
    }

    /// Accumulate another usage record into this one.
    pub fn add(&mut self, other: &TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// One append-only ledger entry for a model call.
///
/// Entries are created by the cost ledger as calls complete and are never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct CostEntry {
    /// Pipeline step that issued the call (e.g. "writing", "editing").
    step: String,
    /// Model identifier the call resolved to.
    model: String,
    /// Token usage reported by the driver.
    usage: TokenUsage,
    /// Computed cost in USD.
    cost: f64,
    /// Wall-clock time the entry was recorded.
    recorded_at: DateTime<Utc>,
}

impl CostEntry {
    /// Create a new entry stamped with the current time.
    pub fn new(
        step: impl Into<String>,
        model: impl Into<String>,
        usage: TokenUsage,
        cost: f64,
    ) -> Self {
        Self {
            step: step.into(),
            model: model.into(),
            usage,
            cost,
            recorded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_totals() {
        let usage = TokenUsage::new(100, 50);
        assert_eq!(*usage.total_tokens(), 150);
    }

    #[test]
    fn usage_accumulates() {
        let mut usage = TokenUsage::new(10, 20);
        usage.add(&TokenUsage::new(5, 5));
        assert_eq!(*usage.prompt_tokens(), 15);
        assert_eq!(*usage.total_tokens(), 40);
    }

    #[test]
    fn unknown_model_costs_zero() {
        let usage = TokenUsage::new(1_000, 1_000);
        assert_eq!(usage.calculate_cost(0.0, 0.0), 0.0);
    }
}
