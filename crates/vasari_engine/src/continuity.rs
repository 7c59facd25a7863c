//! Rolling summary and ending-bridge maintenance.
//!
//! Continuity updates are best-effort: any failure in the summarization
//! call is caught and the previous summary retained, because a stale
//! synopsis is strictly better than a failed chapter.

use serde::{Deserialize, Serialize};
use vasari_core::{tail_chars, truncate_sentences, word_count, ChapterPlan, CostEntry, GenerationRequest};
use vasari_interface::{CostModel, ModelProfile, TextGenerator};

use crate::prompts;

/// Cross-chapter continuity state carried between pipeline runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContinuityState {
    /// Bounded synopsis of all prior chapters.
    pub rolling_summary: String,
    /// Trailing characters of the most recent approved chapter, used
    /// verbatim as the bridging anchor for the next chapter.
    pub previous_ending: String,
}

/// Maintains the rolling summary and ending bridge.
#[derive(Debug, Clone, Copy)]
pub struct ContinuityTracker {
    summary_word_cap: usize,
    ending_bridge_chars: usize,
}

impl ContinuityTracker {
    /// Create a tracker with the given bounds.
    pub fn new(summary_word_cap: usize, ending_bridge_chars: usize) -> Self {
        Self {
            summary_word_cap,
            ending_bridge_chars,
        }
    }

    /// Derive the ending bridge for a finished chapter.
    pub fn ending_bridge(&self, chapter_text: &str) -> String {
        tail_chars(chapter_text, self.ending_bridge_chars).to_string()
    }

    /// Fold a finished chapter into the continuity state.
    ///
    /// Never fails: a summarization error retains the prior summary, and
    /// an over-cap summary is condensed once and then truncated on
    /// sentence boundaries if condensation did not bring it under the cap.
    #[tracing::instrument(skip_all, fields(chapter = plan.number))]
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        generator: &dyn TextGenerator,
        profile: &ModelProfile,
        prior: &ContinuityState,
        chapter_text: &str,
        plan: &ChapterPlan,
        pricing: &dyn CostModel,
        costs: &mut Vec<CostEntry>,
    ) -> ContinuityState {
        let previous_ending = self.ending_bridge(chapter_text);

        let summary = match self
            .summarize(generator, profile, &prior.rolling_summary, chapter_text, plan, pricing, costs)
            .await
        {
            Some(summary) => summary,
            None => {
                tracing::warn!("Summarization failed; retaining previous rolling summary");
                prior.rolling_summary.clone()
            }
        };

        let summary = self
            .enforce_cap(generator, profile, summary, pricing, costs)
            .await;

        ContinuityState {
            rolling_summary: summary,
            previous_ending,
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn summarize(
        &self,
        generator: &dyn TextGenerator,
        profile: &ModelProfile,
        prior_summary: &str,
        chapter_text: &str,
        plan: &ChapterPlan,
        pricing: &dyn CostModel,
        costs: &mut Vec<CostEntry>,
    ) -> Option<String> {
        let request = GenerationRequest {
            system: Some(prompts::summary_system()),
            prompt: prompts::summary_prompt(prior_summary, chapter_text, plan),
            max_tokens: *profile.max_tokens(),
            temperature: *profile.temperature(),
            model: Some(profile.id().clone()),
        };
        match generator.generate(&request).await {
            Ok(response) => {
                let cost = pricing.cost(profile.id(), &response.usage);
                costs.push(CostEntry::new("continuity", profile.id(), response.usage, cost));
                let text = response.text.trim().to_string();
                if text.is_empty() { None } else { Some(text) }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Continuity summarization call failed");
                None
            }
        }
    }

    /// Bring a summary under the word cap.
    async fn enforce_cap(
        &self,
        generator: &dyn TextGenerator,
        profile: &ModelProfile,
        summary: String,
        pricing: &dyn CostModel,
        costs: &mut Vec<CostEntry>,
    ) -> String {
        if word_count(&summary) <= self.summary_word_cap {
            return summary;
        }
        tracing::debug!(
            words = word_count(&summary),
            cap = self.summary_word_cap,
            "Rolling summary over cap; condensing"
        );
        let request = GenerationRequest {
            system: Some(prompts::summary_system()),
            prompt: prompts::condense_prompt(&summary, self.summary_word_cap),
            max_tokens: *profile.max_tokens(),
            temperature: *profile.temperature(),
            model: Some(profile.id().clone()),
        };
        let condensed = match generator.generate(&request).await {
            Ok(response) => {
                let cost = pricing.cost(profile.id(), &response.usage);
                costs.push(CostEntry::new("continuity", profile.id(), response.usage, cost));
                let text = response.text.trim().to_string();
                if text.is_empty() { summary } else { text }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Condensation call failed; truncating");
                summary
            }
        };
        if word_count(&condensed) <= self.summary_word_cap {
            condensed
        } else {
            truncate_sentences(&condensed, self.summary_word_cap)
        }
    }
}
