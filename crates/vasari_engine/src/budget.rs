//! Priority-ordered token budget packing for writer context.
//!
//! The packer decides which context items fit a token budget. Token counts
//! use a fixed `ceil(chars / 4)` heuristic rather than an exact tokenizer:
//! deliberately conservative and deterministic so packing decisions are
//! reproducible in tests.

/// Standard priorities for the writer context items.
pub mod priority {
    /// Chapter plan (always required).
    pub const PLAN: u32 = 100;
    /// Previous chapter ending bridge.
    pub const PREVIOUS_ENDING: u32 = 80;
    /// Rolling summary of all prior chapters.
    pub const ROLLING_SUMMARY: u32 = 60;
    /// Retrieved memory context.
    pub const MEMORY: u32 = 40;
}

/// Estimate the token count of a text.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// One candidate item for the context window.
#[derive(Debug, Clone, PartialEq, Eq, derive_new::new)]
pub struct ContextItem {
    /// Stable key reported in `included`/`dropped`.
    pub key: String,
    /// The text content.
    pub content: String,
    /// Higher priorities are packed first.
    pub priority: u32,
    /// Required items are included regardless of budget.
    pub required: bool,
}

/// Outcome of a packing run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackResult {
    /// Included contents joined by blank lines, in inclusion order.
    pub text: String,
    /// Estimated tokens of the included items.
    pub total_tokens: usize,
    /// Keys of included items.
    pub included: Vec<String>,
    /// Keys of dropped items.
    pub dropped: Vec<String>,
}

/// Greedily select items into a token budget.
///
/// Required items are included unconditionally and first, in their original
/// order — the budget may be exceeded only by required items. Remaining
/// items are taken in descending priority (stable, so ties keep their
/// original relative order) while the cumulative estimate stays within
/// budget. Items are never split: an item that would overflow is dropped
/// whole.
///
/// # Examples
///
/// ```
/// use vasari_engine::budget::{pack, ContextItem};
///
/// let items = vec![
///     ContextItem::new("plan".into(), "p".repeat(400), 100, true),
///     ContextItem::new("summary".into(), "s".repeat(400), 60, false),
/// ];
/// let result = pack(&items, 150);
/// assert_eq!(result.included, vec!["plan".to_string()]);
/// assert_eq!(result.dropped, vec!["summary".to_string()]);
/// ```
pub fn pack(items: &[ContextItem], budget: usize) -> PackResult {
    let mut included_indices = Vec::new();
    let mut dropped = Vec::new();
    let mut total_tokens = 0usize;

    for (index, item) in items.iter().enumerate() {
        if item.required {
            total_tokens += estimate_tokens(&item.content);
            included_indices.push(index);
        }
    }
    if total_tokens > budget {
        tracing::warn!(
            total_tokens,
            budget,
            "Required context items alone exceed the token budget"
        );
    }

    let mut optional: Vec<usize> = (0..items.len()).filter(|i| !items[*i].required).collect();
    optional.sort_by(|a, b| items[*b].priority.cmp(&items[*a].priority));

    for index in optional {
        let cost = estimate_tokens(&items[index].content);
        if total_tokens + cost <= budget {
            total_tokens += cost;
            included_indices.push(index);
        } else {
            dropped.push(items[index].key.clone());
        }
    }

    let text = included_indices
        .iter()
        .map(|i| items[*i].content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let included = included_indices
        .iter()
        .map(|i| items[*i].key.clone())
        .collect();

    PackResult {
        text,
        total_tokens,
        included,
        dropped,
    }
}

/// Assemble the standard four-item writer context.
///
/// Empty sources are omitted from packing rather than contributing blank
/// separators.
pub fn assemble_writer_context(
    plan: &str,
    previous_ending: &str,
    rolling_summary: &str,
    memory: &str,
    budget: usize,
) -> PackResult {
    let mut items = vec![ContextItem::new(
        "chapter_plan".into(),
        plan.to_string(),
        priority::PLAN,
        true,
    )];
    if !previous_ending.trim().is_empty() {
        items.push(ContextItem::new(
            "previous_ending".into(),
            previous_ending.to_string(),
            priority::PREVIOUS_ENDING,
            false,
        ));
    }
    if !rolling_summary.trim().is_empty() {
        items.push(ContextItem::new(
            "rolling_summary".into(),
            rolling_summary.to_string(),
            priority::ROLLING_SUMMARY,
            false,
        ));
    }
    if !memory.trim().is_empty() {
        items.push(ContextItem::new(
            "memory_context".into(),
            memory.to_string(),
            priority::MEMORY,
            false,
        ));
    }
    pack(&items, budget)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(key: &str, chars: usize, priority: u32, required: bool) -> ContextItem {
        ContextItem::new(key.into(), "x".repeat(chars), priority, required)
    }

    #[test]
    fn required_items_exceed_budget_without_being_dropped() {
        let items = vec![item("a", 400, 10, true), item("b", 400, 90, true)];
        let result = pack(&items, 50);
        assert_eq!(result.included, vec!["a".to_string(), "b".to_string()]);
        assert!(result.dropped.is_empty());
        assert_eq!(result.total_tokens, 200);
    }

    #[test]
    fn optional_items_fill_by_priority() {
        let items = vec![
            item("low", 100, 10, false),
            item("high", 100, 90, false),
            item("mid", 100, 50, false),
        ];
        let result = pack(&items, 60);
        assert_eq!(result.included, vec!["high".to_string(), "mid".to_string()]);
        assert_eq!(result.dropped, vec!["low".to_string()]);
    }

    #[test]
    fn priority_ties_keep_original_order() {
        let items = vec![
            item("first", 100, 50, false),
            item("second", 100, 50, false),
        ];
        let result = pack(&items, 25);
        assert_eq!(result.included, vec!["first".to_string()]);
        assert_eq!(result.dropped, vec!["second".to_string()]);
    }

    #[test]
    fn every_key_lands_in_included_or_dropped() {
        let items = vec![
            item("a", 50, 1, true),
            item("b", 5_000, 80, false),
            item("c", 10, 60, false),
            item("d", 9_000, 40, false),
        ];
        let result = pack(&items, 100);
        let mut all: Vec<String> = result
            .included
            .iter()
            .chain(result.dropped.iter())
            .cloned()
            .collect();
        all.sort();
        assert_eq!(all, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn token_estimate_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn writer_context_includes_plan_first() {
        let result = assemble_writer_context("the plan", "the ending", "the summary", "", 1_000);
        assert_eq!(result.included[0], "chapter_plan");
        assert!(result.text.starts_with("the plan"));
        assert!(!result.included.contains(&"memory_context".to_string()));
    }
}
