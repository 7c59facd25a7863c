//! Append-only cost accounting for model calls.

use serde::{Deserialize, Serialize};
use vasari_core::{CostEntry, TokenUsage};
use vasari_interface::CostModel;

/// Accumulates per-call token usage into cost entries and aggregates.
///
/// Entries are append-only; past entries are never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostLedger {
    entries: Vec<CostEntry>,
}

impl CostLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed call.
    pub fn record(
        &mut self,
        step: &str,
        model: &str,
        usage: TokenUsage,
        cost_model: &dyn CostModel,
    ) {
        let cost = cost_model.cost(model, &usage);
        tracing::debug!(step, model, cost, total = usage.total_tokens(), "Recorded model call");
        self.entries.push(CostEntry::new(step, model, usage, cost));
    }

    /// Append pre-computed entries (e.g. from a finished pipeline run).
    pub fn append(&mut self, entries: Vec<CostEntry>) {
        self.entries.extend(entries);
    }

    /// All entries in recording order.
    pub fn entries(&self) -> &[CostEntry] {
        &self.entries
    }

    /// Total cost in USD across all entries.
    pub fn total_cost(&self) -> f64 {
        self.entries.iter().map(|e| e.cost()).sum()
    }

    /// Aggregate token usage across all entries.
    pub fn total_usage(&self) -> TokenUsage {
        let mut total = TokenUsage::default();
        for entry in &self.entries {
            total.add(entry.usage());
        }
        total
    }

    /// Total cost attributed to one step name.
    pub fn step_cost(&self, step: &str) -> f64 {
        self.entries
            .iter()
            .filter(|e| e.step() == step)
            .map(|e| e.cost())
            .sum()
    }

    /// Distinct model identifiers seen so far, in first-use order.
    pub fn models(&self) -> Vec<String> {
        let mut models: Vec<String> = Vec::new();
        for entry in &self.entries {
            if !models.contains(entry.model()) {
                models.push(entry.model().clone());
            }
        }
        models
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vasari_interface::{ModelProfile, ModelRegistry, ModelRole, PricingTable};

    fn pricing() -> PricingTable {
        let registry = ModelRegistry::new().with_role(
            ModelRole::Writing,
            ModelProfile::new("prose-large", None, None, 1.0, 2.0),
        );
        PricingTable::from_registry(&registry)
    }

    #[test]
    fn records_and_totals() {
        let mut ledger = CostLedger::new();
        let pricing = pricing();
        ledger.record("writing", "prose-large", TokenUsage::new(1_000_000, 500_000), &pricing);
        ledger.record("editing", "unknown-model", TokenUsage::new(10, 10), &pricing);
        assert_eq!(ledger.entries().len(), 2);
        assert!((ledger.total_cost() - 2.0).abs() < 1e-9);
        assert!((ledger.step_cost("writing") - 2.0).abs() < 1e-9);
        assert_eq!(ledger.step_cost("editing"), 0.0);
        assert_eq!(*ledger.total_usage().total_tokens(), 1_500_020);
    }

    #[test]
    fn models_deduplicate_in_order() {
        let mut ledger = CostLedger::new();
        let pricing = pricing();
        ledger.record("a", "m1", TokenUsage::default(), &pricing);
        ledger.record("b", "m2", TokenUsage::default(), &pricing);
        ledger.record("c", "m1", TokenUsage::default(), &pricing);
        assert_eq!(ledger.models(), vec!["m1", "m2"]);
    }
}
