//! The per-chapter generation state machine.
//!
//! One pipeline run takes a chapter plan through planning, writing (with
//! refusal retries and word-count enforcement), editing, and a continuity
//! update. Both the streaming "generate everything" entry point and the
//! interactive per-chapter entry point on the session controller drive this
//! same implementation, so retry and expansion behavior cannot diverge.

use serde::de::DeserializeOwned;
use std::sync::LazyLock;

use regex::Regex;
use vasari_core::{
    word_count, ChapterContent, ChapterPlan, CostEntry, DetailedChapterPlan, EditResult,
    GenerationRequest, SessionEvent, StructuredRequest,
};
use vasari_error::{GenerationError, GenerationErrorKind, VasariResult};
use vasari_interface::{CostModel, MemoryRecall, ModelProfile, ModelRegistry, ModelRole, TextGenerator};

use crate::budget;
use crate::config::EngineConfig;
use crate::continuity::{ContinuityState, ContinuityTracker};
use crate::events::EventBus;
use crate::prompts::{self, RewriteDirective};
use crate::refusal::RefusalClassifier;

/// Minimum words a draft must have before expansion is attempted on it;
/// below this the writer prompt is simply re-run from scratch.
const REGENERATE_BELOW_WORDS: usize = 50;

/// Phases of the chapter state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PipelinePhase {
    /// Producing the detailed chapter plan.
    Planning,
    /// Drafting prose, including refusal retries and the expand loop.
    Writing,
    /// Editorial scoring and the approve/reject decision.
    Editing,
    /// Finalizing content and updating cross-chapter state.
    Continuity,
    /// The run is finished.
    Complete,
}

/// Everything a finished pipeline run hands back to the session.
#[derive(Debug, Clone)]
pub struct ChapterOutcome {
    /// The finished chapter.
    pub content: ChapterContent,
    /// The detailed plan the chapter was written from.
    pub plan: DetailedChapterPlan,
    /// Updated continuity state derived from the finished chapter.
    pub continuity: ContinuityState,
    /// Cost entries for every model call the run made.
    pub costs: Vec<CostEntry>,
}

/// Drives one chapter through the plan → write → edit → continuity machine.
pub struct ChapterPipeline<'a> {
    generator: &'a dyn TextGenerator,
    registry: &'a ModelRegistry,
    config: &'a EngineConfig,
    classifier: &'a RefusalClassifier,
    tracker: &'a ContinuityTracker,
    pricing: &'a dyn CostModel,
    events: &'a EventBus,
    memory: Option<&'a dyn MemoryRecall>,
}

impl<'a> ChapterPipeline<'a> {
    /// Create a pipeline over the given collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        generator: &'a dyn TextGenerator,
        registry: &'a ModelRegistry,
        config: &'a EngineConfig,
        classifier: &'a RefusalClassifier,
        tracker: &'a ContinuityTracker,
        pricing: &'a dyn CostModel,
        events: &'a EventBus,
    ) -> Self {
        Self {
            generator,
            registry,
            config,
            classifier,
            tracker,
            pricing,
            events,
            memory: None,
        }
    }

    /// Attach a memory retrieval backend.
    pub fn with_memory(mut self, memory: &'a dyn MemoryRecall) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Run the full state machine for one chapter.
    ///
    /// Generation-call failures at any phase propagate as a hard chapter
    /// failure; the caller marks the chapter failed and moves on. Refusals
    /// and short output are handled internally and never surface as
    /// errors.
    #[tracing::instrument(skip_all, fields(chapter = plan.number, target = plan.target_words))]
    pub async fn run(
        &self,
        plan: &ChapterPlan,
        continuity: &ContinuityState,
        rewrite: Option<RewriteDirective>,
    ) -> VasariResult<ChapterOutcome> {
        let planning_model = self.registry.resolve(ModelRole::Planning)?;
        let writing_model = self.registry.resolve(ModelRole::Writing)?;
        let editing_model = self.registry.resolve(ModelRole::Editing)?;
        let continuity_model = self.registry.resolve(ModelRole::Continuity)?;

        self.events.emit(SessionEvent::ChapterStarted {
            number: plan.number,
            title: plan.title.clone(),
        });

        let memory_context = self.recall_memory(plan).await;

        let mut phase = PipelinePhase::Planning;
        let mut costs: Vec<CostEntry> = Vec::new();
        let mut detailed = DetailedChapterPlan::default();
        let mut draft = String::new();
        let mut edit_cycles = 0u32;
        let mut rewrite = rewrite;
        let mut outcome: Option<ChapterOutcome> = None;

        while phase != PipelinePhase::Complete {
            phase = match phase {
                PipelinePhase::Planning => {
                    detailed = self
                        .plan_chapter(plan, continuity, &memory_context, planning_model, &mut costs)
                        .await?;
                    PipelinePhase::Writing
                }
                PipelinePhase::Writing => {
                    draft = self
                        .write_draft(
                            plan,
                            &detailed,
                            continuity,
                            &memory_context,
                            rewrite.take(),
                            writing_model,
                            &mut costs,
                        )
                        .await?;
                    self.events.emit(SessionEvent::ChapterWritten {
                        number: plan.number,
                        words: word_count(&draft),
                    });
                    PipelinePhase::Editing
                }
                PipelinePhase::Editing => {
                    edit_cycles += 1;
                    let review = self
                        .edit_draft(&draft, &detailed, editing_model, &mut costs)
                        .await?;
                    self.events.emit(SessionEvent::EditCycle {
                        number: plan.number,
                        cycle: edit_cycles,
                        overall: review.overall,
                        approved: review.approved,
                    });
                    if review.approved {
                        PipelinePhase::Continuity
                    } else if edit_cycles >= *self.config.max_edit_cycles() {
                        // Runaway-rejection safety valve: accept the draft
                        // once the cycle budget is spent.
                        tracing::warn!(
                            cycles = edit_cycles,
                            overall = review.overall,
                            "Edit cycle budget exhausted; forcing approval"
                        );
                        PipelinePhase::Continuity
                    } else {
                        let instructions = review
                            .rewrite_instructions
                            .filter(|text| !text.trim().is_empty())
                            .unwrap_or(review.notes);
                        rewrite = Some(RewriteDirective {
                            instructions,
                            previous_draft: draft.clone(),
                        });
                        PipelinePhase::Writing
                    }
                }
                PipelinePhase::Continuity => {
                    let updated = self
                        .tracker
                        .update(
                            self.generator,
                            continuity_model,
                            continuity,
                            &draft,
                            plan,
                            self.pricing,
                            &mut costs,
                        )
                        .await;
                    let title = if detailed.title.is_empty() {
                        plan.title.clone()
                    } else {
                        detailed.title.clone()
                    };
                    let content = ChapterContent::new(
                        plan.number,
                        title,
                        std::mem::take(&mut draft),
                        plan.summary.clone(),
                        edit_cycles,
                        true,
                    );
                    self.events.emit(SessionEvent::ChapterComplete {
                        number: plan.number,
                        words: content.word_count,
                        edit_cycles,
                    });
                    outcome = Some(ChapterOutcome {
                        content,
                        plan: detailed.clone(),
                        continuity: updated,
                        costs: std::mem::take(&mut costs),
                    });
                    PipelinePhase::Complete
                }
                PipelinePhase::Complete => PipelinePhase::Complete,
            };
        }

        Ok(outcome.expect("the continuity phase is the only transition to complete"))
    }

    /// Grow an existing approved chapter toward a new target.
    ///
    /// Used by the session's expand operation; runs the same expand loop
    /// and final scrub as the writing phase, without re-planning or
    /// re-editing.
    #[tracing::instrument(skip_all, fields(chapter = plan.number, target = target))]
    pub(crate) async fn expand_existing(
        &self,
        plan: &ChapterPlan,
        continuity: &ContinuityState,
        text: String,
        target: u32,
        costs: &mut Vec<CostEntry>,
    ) -> VasariResult<String> {
        let writing_model = self.registry.resolve(ModelRole::Writing)?;
        let context = budget::assemble_writer_context(
            &prompts::chapter_brief(plan),
            &continuity.previous_ending,
            &continuity.rolling_summary,
            "",
            *self.config.context_budget_tokens(),
        );
        let base_prompt = prompts::writer_prompt(&context.text, target, None);
        let expanded = self
            .expand_to_target(plan.number, &base_prompt, text, target, writing_model, costs)
            .await?;
        let expanded = self.classifier.scrub(&expanded).trim().to_string();
        let words = word_count(&expanded);
        if words < self.config.word_floor(target) {
            self.events.emit(SessionEvent::WordCountWarning {
                number: plan.number,
                words,
                target,
            });
        }
        Ok(expanded)
    }

    /// Fetch memory context for a chapter; failures degrade to empty.
    async fn recall_memory(&self, plan: &ChapterPlan) -> String {
        let Some(memory) = self.memory else {
            return String::new();
        };
        let query = format!("{} {}", plan.title, plan.summary);
        match memory.relevant_context(&query, plan.number).await {
            Ok(context) => context.as_context(),
            Err(e) => {
                tracing::warn!(error = %e, "Memory retrieval failed; continuing without context");
                String::new()
            }
        }
    }

    async fn plan_chapter(
        &self,
        plan: &ChapterPlan,
        continuity: &ContinuityState,
        memory: &str,
        profile: &ModelProfile,
        costs: &mut Vec<CostEntry>,
    ) -> VasariResult<DetailedChapterPlan> {
        let object = self
            .generate_structured(
                "planning",
                profile,
                prompts::plan_system(),
                prompts::plan_prompt(plan, &continuity.rolling_summary, memory),
                prompts::plan_schema(),
                costs,
            )
            .await?;
        let mut detailed: DetailedChapterPlan = decode("planning", object)?;
        detailed.chapter_number = plan.number;
        if detailed.title.is_empty() {
            detailed.title = plan.title.clone();
        }
        Ok(detailed)
    }

    /// The writing phase: refusal-retry protocol, then the expand loop,
    /// then a final scrub.
    #[allow(clippy::too_many_arguments)]
    async fn write_draft(
        &self,
        plan: &ChapterPlan,
        detailed: &DetailedChapterPlan,
        continuity: &ContinuityState,
        memory: &str,
        rewrite: Option<RewriteDirective>,
        profile: &ModelProfile,
        costs: &mut Vec<CostEntry>,
    ) -> VasariResult<String> {
        let context = budget::assemble_writer_context(
            &detailed.as_context(),
            &continuity.previous_ending,
            &continuity.rolling_summary,
            memory,
            *self.config.context_budget_tokens(),
        );
        if !context.dropped.is_empty() {
            tracing::debug!(dropped = ?context.dropped, "Token budget dropped context items");
        }
        let base_prompt = prompts::writer_prompt(&context.text, plan.target_words, rewrite.as_ref());

        let draft = self
            .draft_with_retries(plan.number, &base_prompt, profile, costs)
            .await?;
        let draft = self
            .expand_to_target(plan.number, &base_prompt, draft, plan.target_words, profile, costs)
            .await?;
        let draft = self.classifier.scrub(&draft).trim().to_string();

        let words = word_count(&draft);
        if words < self.config.word_floor(plan.target_words) {
            self.events.emit(SessionEvent::WordCountWarning {
                number: plan.number,
                words,
                target: plan.target_words,
            });
        }
        Ok(draft)
    }

    /// The refusal-retry protocol.
    ///
    /// Each retry appends an escalating corrective clause. Across all
    /// attempts the best salvage candidate is the longest one whose salvage
    /// itself re-classifies as non-refusal. When every attempt refuses, the
    /// best candidate is accepted only above the salvage word floor;
    /// otherwise the draft is deliberately left empty so the expand loop
    /// regenerates from scratch.
    async fn draft_with_retries(
        &self,
        number: u32,
        base_prompt: &str,
        profile: &ModelProfile,
        costs: &mut Vec<CostEntry>,
    ) -> VasariResult<String> {
        let mut best_salvage = String::new();
        for attempt in 0..=*self.config.max_refusal_retries() {
            let prompt = format!("{base_prompt}{}", prompts::retry_clause(attempt));
            let text = self
                .generate_text("writing", profile, prompts::writer_system(), prompt, None, costs)
                .await?;
            let verdict = self.classifier.classify(&text);
            if !verdict.is_refusal {
                return Ok(text);
            }
            self.events.emit(SessionEvent::RefusalDetected { number, attempt });
            tracing::warn!(attempt, "Writer response classified as refusal");

            let salvage = verdict.salvaged;
            if !self.classifier.classify(&salvage).is_refusal
                && word_count(&salvage) > word_count(&best_salvage)
            {
                best_salvage = salvage;
            }
        }

        if word_count(&best_salvage) >= *self.config.min_salvage_words() {
            tracing::info!(words = word_count(&best_salvage), "Accepting best salvaged draft");
            Ok(best_salvage)
        } else {
            tracing::warn!("No usable salvage; draft left empty for full regeneration");
            Ok(String::new())
        }
    }

    /// The word-count enforcement loop.
    ///
    /// Runs while the draft is below `floor(target × (1 − tolerance))` and
    /// attempts remain. A draft under [`REGENERATE_BELOW_WORDS`] words is
    /// regenerated from the writer prompt outright; otherwise the model is
    /// asked to expand the existing text with a deficit-proportional token
    /// allowance. A result is accepted only if it strictly grows the word
    /// count; a model that got shorter is not trusted further and the loop
    /// keeps the best so far.
    async fn expand_to_target(
        &self,
        number: u32,
        base_prompt: &str,
        initial: String,
        target: u32,
        profile: &ModelProfile,
        costs: &mut Vec<CostEntry>,
    ) -> VasariResult<String> {
        let floor = self.config.word_floor(target);
        let mut best = initial;
        let mut attempts = 0u32;
        while word_count(&best) < floor && attempts < *self.config.max_expand_attempts() {
            attempts += 1;
            let words = word_count(&best);
            self.events.emit(SessionEvent::ExpandAttempt {
                number,
                attempt: attempts,
                words,
                target,
            });
            let candidate = if words < REGENERATE_BELOW_WORDS {
                self.generate_text(
                    "writing",
                    profile,
                    prompts::writer_system(),
                    base_prompt.to_string(),
                    None,
                    costs,
                )
                .await?
            } else {
                let deficit = (target as usize).saturating_sub(words);
                let allowance = ((deficit * 2) as u32).max(*self.config.min_expand_tokens());
                self.generate_text(
                    "expand",
                    profile,
                    prompts::writer_system(),
                    prompts::expand_prompt(&best, target, deficit),
                    Some(allowance),
                    costs,
                )
                .await?
            };
            let candidate = strip_expansion_preamble(&candidate).trim().to_string();
            if word_count(&candidate) > word_count(&best) {
                best = candidate;
            } else {
                tracing::warn!(
                    attempt = attempts,
                    "Expansion did not grow the draft; keeping best so far"
                );
                break;
            }
        }
        Ok(best)
    }

    async fn edit_draft(
        &self,
        draft: &str,
        detailed: &DetailedChapterPlan,
        profile: &ModelProfile,
        costs: &mut Vec<CostEntry>,
    ) -> VasariResult<EditResult> {
        let object = self
            .generate_structured(
                "editing",
                profile,
                prompts::edit_system(),
                prompts::edit_prompt(draft, &detailed.as_context()),
                prompts::edit_schema(),
                costs,
            )
            .await?;
        let review: EditResult = decode("editing", object)?;
        Ok(review.normalized())
    }

    async fn generate_text(
        &self,
        step: &str,
        profile: &ModelProfile,
        system: String,
        prompt: String,
        max_tokens: Option<u32>,
        costs: &mut Vec<CostEntry>,
    ) -> VasariResult<String> {
        let request = GenerationRequest {
            system: Some(system),
            prompt,
            max_tokens: max_tokens.or(*profile.max_tokens()),
            temperature: *profile.temperature(),
            model: Some(profile.id().clone()),
        };
        let response = self.generator.generate(&request).await?;
        let cost = self.pricing.cost(profile.id(), &response.usage);
        costs.push(CostEntry::new(step, profile.id(), response.usage, cost));
        Ok(response.text)
    }

    async fn generate_structured(
        &self,
        step: &str,
        profile: &ModelProfile,
        system: String,
        prompt: String,
        schema: serde_json::Value,
        costs: &mut Vec<CostEntry>,
    ) -> VasariResult<serde_json::Value> {
        let request = StructuredRequest {
            system: Some(system),
            prompt,
            schema,
            max_tokens: *profile.max_tokens(),
            temperature: *profile.temperature(),
            model: Some(profile.id().clone()),
        };
        let response = self.generator.generate_structured(&request).await?;
        let cost = self.pricing.cost(profile.id(), &response.usage);
        costs.push(CostEntry::new(step, profile.id(), response.usage, cost));
        Ok(response.object)
    }
}

/// Decode a structured response object into a typed value.
fn decode<T: DeserializeOwned>(step: &str, object: serde_json::Value) -> VasariResult<T> {
    serde_json::from_value(object).map_err(|e| {
        GenerationError::new(GenerationErrorKind::MalformedStructuredOutput {
            step: step.to_string(),
            message: e.to_string(),
        })
        .into()
    })
}

static META_PREAMBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(here(?:'s| is)|below is|sure[,!. ]|certainly[,!. ]|of course[,!. ]|i(?:'ve| have) (?:expanded|revised|continued|rewritten))",
    )
    .expect("static preamble pattern compiles")
});

/// Strip a leading meta-commentary line an expansion model may prepend
/// (e.g. "Below is the expanded chapter...").
fn strip_expansion_preamble(text: &str) -> &str {
    let trimmed = text.trim_start();
    if let Some((first_line, rest)) = trimmed.split_once('\n') {
        if first_line.chars().count() <= 200 && META_PREAMBLE.is_match(first_line.trim_start()) {
            return rest.trim_start();
        }
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preamble_line_is_stripped() {
        let text = "Below is the expanded chapter with deeper scenes:\n\nThe tide rose fast.";
        assert_eq!(strip_expansion_preamble(text), "The tide rose fast.");
    }

    #[test]
    fn prose_first_lines_are_kept() {
        let text = "The tide rose fast.\n\nIt did not stop at the sea wall.";
        assert_eq!(strip_expansion_preamble(text), text);
    }

    #[test]
    fn phases_render_snake_case() {
        assert_eq!(PipelinePhase::Planning.to_string(), "planning");
        assert_eq!(PipelinePhase::Complete.to_string(), "complete");
    }
}
