//! Session controller: drives the chapter pipeline across a whole outline.
//!
//! The controller is the single writer of session state. Chapters are
//! generated strictly one at a time; callers inspect progress through
//! snapshots rather than aliasing the internal maps.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::Stream;
use serde::{Deserialize, Serialize};
use vasari_core::{
    Book, BookMetadata, ChapterContent, ChapterStatus, EventSink, Outline, OutlineBrief,
    OutlineEdit, Progress, SessionEvent, StructuredRequest,
};
use vasari_error::{SessionError, SessionErrorKind, VasariResult};
use vasari_interface::{
    MemoryRecall, ModelRegistry, ModelRole, PricingTable, SessionStore, TextGenerator,
};

use crate::config::EngineConfig;
use crate::continuity::{ContinuityState, ContinuityTracker};
use crate::events::EventBus;
use crate::ledger::CostLedger;
use crate::pipeline::ChapterPipeline;
use crate::prompts::{self, RewriteDirective};
use crate::refusal::RefusalClassifier;

/// Serializable session state, owned exclusively by the controller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    /// Session identifier, used as the storage key.
    id: String,
    /// The outline, once generated.
    outline: Option<Outline>,
    /// Whether the outline has been approved for chapter generation.
    outline_approved: bool,
    /// Finished chapter content by number.
    chapters: BTreeMap<u32, ChapterContent>,
    /// Per-chapter generation status.
    statuses: BTreeMap<u32, ChapterStatus>,
    /// Rolling summary and ending bridge.
    continuity: ContinuityState,
    /// Append-only cost ledger.
    ledger: CostLedger,
}

/// Orchestrates outline generation, approval, and chapter generation for
/// one book.
///
/// Multiple controllers may run concurrently; they share no mutable state.
pub struct SessionController<G: TextGenerator> {
    generator: G,
    registry: ModelRegistry,
    config: EngineConfig,
    classifier: RefusalClassifier,
    tracker: ContinuityTracker,
    pricing: PricingTable,
    events: EventBus,
    memory: Option<Arc<dyn MemoryRecall>>,
    store: Option<Arc<dyn SessionStore>>,
    state: SessionState,
}

impl<G: TextGenerator> SessionController<G> {
    /// Create a controller with a fresh session id.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` does not validate.
    pub fn new(generator: G, registry: ModelRegistry, config: EngineConfig) -> VasariResult<Self> {
        config.validate()?;
        let tracker = ContinuityTracker::new(
            *config.summary_word_cap(),
            *config.ending_bridge_chars(),
        );
        let pricing = PricingTable::from_registry(&registry);
        Ok(Self {
            generator,
            registry,
            config,
            classifier: RefusalClassifier::new(),
            tracker,
            pricing,
            events: EventBus::new(),
            memory: None,
            store: None,
            state: SessionState {
                id: uuid::Uuid::new_v4().to_string(),
                ..SessionState::default()
            },
        })
    }

    /// Attach a memory retrieval backend.
    pub fn with_memory(mut self, memory: Arc<dyn MemoryRecall>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Attach a session store for save/restore.
    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Register an event sink.
    pub fn subscribe(&mut self, sink: Arc<dyn EventSink>) {
        self.events.subscribe(sink);
    }

    /// Session identifier.
    pub fn id(&self) -> &str {
        &self.state.id
    }

    /// Snapshot of the outline, if one exists.
    pub fn outline(&self) -> Option<Outline> {
        self.state.outline.clone()
    }

    /// Whether the outline has been approved.
    pub fn outline_approved(&self) -> bool {
        self.state.outline_approved
    }

    /// Snapshot of one chapter's content.
    pub fn get_chapter(&self, number: u32) -> Option<ChapterContent> {
        self.state.chapters.get(&number).cloned()
    }

    /// Current status of one chapter.
    pub fn status(&self, number: u32) -> Option<ChapterStatus> {
        self.state.statuses.get(&number).copied()
    }

    /// Generate a fresh outline from a brief, replacing any existing one.
    ///
    /// Clears all chapter state and revokes approval; the new outline must
    /// be approved before chapters can be generated.
    #[tracing::instrument(skip_all, fields(title = %brief.title(), chapters = brief.chapter_count()))]
    pub async fn generate_outline(&mut self, brief: &OutlineBrief) -> VasariResult<Outline> {
        let profile = self.registry.resolve(ModelRole::Outline)?;
        let request = StructuredRequest {
            system: Some(prompts::outline_system()),
            prompt: prompts::outline_prompt(brief),
            schema: prompts::outline_schema(),
            max_tokens: *profile.max_tokens(),
            temperature: *profile.temperature(),
            model: Some(profile.id().clone()),
        };
        let response = self.generator.generate_structured(&request).await?;
        self.state
            .ledger
            .record("outline", profile.id(), response.usage, &self.pricing);

        let outline: Outline = serde_json::from_value(response.object).map_err(|e| {
            vasari_error::GenerationError::new(
                vasari_error::GenerationErrorKind::MalformedStructuredOutput {
                    step: "outline".to_string(),
                    message: e.to_string(),
                },
            )
        })?;
        let outline = outline
            .renumbered()
            .with_default_target_words(*brief.words_per_chapter());

        self.state.statuses = outline
            .chapters()
            .iter()
            .map(|c| (c.number, ChapterStatus::Pending))
            .collect();
        self.state.chapters.clear();
        self.state.continuity = ContinuityState::default();
        self.state.outline_approved = false;
        self.events.emit(SessionEvent::OutlineGenerated {
            title: outline.title().clone(),
            chapters: outline.len(),
        });
        self.state.outline = Some(outline.clone());
        Ok(outline)
    }

    /// Regenerate the outline from a (possibly revised) brief.
    pub async fn regenerate_outline(&mut self, brief: &OutlineBrief) -> VasariResult<Outline> {
        self.generate_outline(brief).await
    }

    /// Apply a structural edit to the unapproved outline.
    ///
    /// # Errors
    ///
    /// Fails if no outline exists, if the outline is already approved, or
    /// if the edit itself is invalid.
    pub fn update_outline(&mut self, edit: OutlineEdit) -> VasariResult<()> {
        if self.state.outline_approved {
            return Err(SessionError::new(SessionErrorKind::OutlineLocked).into());
        }
        let outline = self
            .state
            .outline
            .as_mut()
            .ok_or_else(|| SessionError::new(SessionErrorKind::NoOutline))?;
        outline.apply(edit)?;
        self.state.statuses = outline
            .chapters()
            .iter()
            .map(|c| (c.number, ChapterStatus::Pending))
            .collect();
        Ok(())
    }

    /// Approve the outline, unlocking chapter generation.
    ///
    /// # Errors
    ///
    /// Fails if no outline exists.
    pub fn approve_outline(&mut self) -> VasariResult<()> {
        if self.state.outline.is_none() {
            return Err(SessionError::new(SessionErrorKind::NoOutline).into());
        }
        self.state.outline_approved = true;
        Ok(())
    }

    /// Generate (or regenerate) one chapter.
    ///
    /// On failure the chapter's status becomes `failed`, a `chapter_failed`
    /// event is emitted, and the error is returned; other chapters are
    /// unaffected.
    #[tracing::instrument(skip(self), fields(session = %self.state.id))]
    pub async fn generate_chapter(&mut self, number: u32) -> VasariResult<ChapterContent> {
        let plan = self.chapter_plan(number)?;
        self.state.statuses.insert(number, ChapterStatus::Generating);

        let continuity = self.state.continuity.clone();
        let result = {
            let pipeline = self.pipeline();
            pipeline.run(&plan, &continuity, None).await
        };
        self.absorb_outcome(number, result)
    }

    /// Generate every remaining pending chapter, in order, as a stream.
    ///
    /// Each chapter's success or failure is independent; a failed chapter
    /// is reported and the stream moves on. Dropping the stream between
    /// chapters cancels the rest; a chapter already in flight runs to
    /// completion or failure first.
    ///
    /// # Errors
    ///
    /// Fails immediately if the outline is missing or unapproved.
    pub fn generate_remaining(
        &mut self,
    ) -> VasariResult<impl Stream<Item = (u32, VasariResult<ChapterContent>)> + '_> {
        self.ensure_approved()?;
        let pending: Vec<u32> = self
            .state
            .statuses
            .iter()
            .filter(|(_, status)| **status == ChapterStatus::Pending)
            .map(|(number, _)| *number)
            .collect();
        Ok(async_stream::stream! {
            for number in pending {
                // A prior iteration (or an interleaved caller) may have
                // touched this chapter; only pending ones are generated.
                if self.status(number) != Some(ChapterStatus::Pending) {
                    continue;
                }
                let result = self.generate_chapter(number).await;
                yield (number, result);
            }
        })
    }

    /// Rewrite an existing chapter with free-text feedback.
    ///
    /// Runs the full pipeline with the feedback injected as editorial
    /// instructions and the previous draft attached for reference.
    #[tracing::instrument(skip(self, feedback), fields(session = %self.state.id))]
    pub async fn rewrite_chapter(
        &mut self,
        number: u32,
        feedback: &str,
    ) -> VasariResult<ChapterContent> {
        let plan = self.chapter_plan(number)?;
        let previous = self
            .state
            .chapters
            .get(&number)
            .ok_or_else(|| SessionError::new(SessionErrorKind::ChapterNotGenerated(number)))?;
        let directive = RewriteDirective {
            instructions: feedback.to_string(),
            previous_draft: previous.text.clone(),
        };
        self.state.statuses.insert(number, ChapterStatus::Generating);

        let continuity = self.state.continuity.clone();
        let result = {
            let pipeline = self.pipeline();
            pipeline.run(&plan, &continuity, Some(directive)).await
        };
        self.absorb_outcome(number, result)
    }

    /// Expand an already-approved chapter toward a (possibly new) target.
    #[tracing::instrument(skip(self), fields(session = %self.state.id))]
    pub async fn expand_chapter(
        &mut self,
        number: u32,
        new_target: Option<u32>,
    ) -> VasariResult<ChapterContent> {
        let plan = self.chapter_plan(number)?;
        let existing = self
            .state
            .chapters
            .get(&number)
            .ok_or_else(|| SessionError::new(SessionErrorKind::ChapterNotGenerated(number)))?
            .clone();
        if !existing.approved {
            return Err(SessionError::new(SessionErrorKind::ChapterNotApproved(number)).into());
        }
        let target = new_target.unwrap_or(plan.target_words);
        let continuity = self.state.continuity.clone();
        let mut costs = Vec::new();

        let result = {
            let pipeline = self.pipeline();
            pipeline
                .expand_existing(&plan, &continuity, existing.text.clone(), target, &mut costs)
                .await
        };
        self.state.ledger.append(costs);
        let text = result?;

        let content = ChapterContent::new(
            number,
            existing.title.clone(),
            text,
            existing.summary.clone(),
            existing.edit_cycles,
            true,
        );
        // The ending bridge tracks the latest chapter's tail; earlier
        // chapters growing does not move it.
        if self.is_latest_generated(number) {
            self.state.continuity.previous_ending = self.tracker.ending_bridge(&content.text);
        }
        self.events.emit(SessionEvent::ChapterComplete {
            number,
            words: content.word_count,
            edit_cycles: content.edit_cycles,
        });
        self.state.chapters.insert(number, content.clone());
        Ok(content)
    }

    /// Progress snapshot: completion counts, words, and cost.
    ///
    /// The remaining-cost estimate extrapolates the mean cost of completed
    /// chapters over the pending ones; it is zero until a chapter finishes.
    pub fn progress(&self) -> Progress {
        let total = self
            .state
            .outline
            .as_ref()
            .map(|o| o.len())
            .unwrap_or_default();
        let completed = self
            .state
            .statuses
            .values()
            .filter(|s| **s == ChapterStatus::Approved)
            .count();
        let failed = self
            .state
            .statuses
            .values()
            .filter(|s| **s == ChapterStatus::Failed)
            .count();
        let total_words = self.state.chapters.values().map(|c| c.word_count).sum();
        let total_cost = self.state.ledger.total_cost();
        let remaining = total.saturating_sub(completed);
        let estimated_remaining_cost = if completed == 0 {
            0.0
        } else {
            (total_cost / completed as f64) * remaining as f64
        };
        Progress::new(
            total,
            completed,
            failed,
            total_words,
            total_cost,
            estimated_remaining_cost,
        )
    }

    /// Persist the session through the configured store.
    ///
    /// Returns the session id the state was saved under.
    ///
    /// # Errors
    ///
    /// Fails if no store is configured or the store rejects the write.
    pub async fn save(&self) -> VasariResult<String> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| SessionError::new(SessionErrorKind::StoreNotConfigured))?;
        let blob = serde_json::to_vec(&self.state).map_err(|e| {
            SessionError::new(SessionErrorKind::StoreFailed(format!(
                "failed to serialize session: {e}"
            )))
        })?;
        store.save(&self.state.id, &blob).await?;
        self.events.emit(SessionEvent::SessionSaved {
            id: self.state.id.clone(),
        });
        Ok(self.state.id.clone())
    }

    /// Replace this controller's state with a previously saved session.
    ///
    /// # Errors
    ///
    /// Fails if no store is configured, the id is unknown, or the blob
    /// does not decode.
    pub async fn restore(&mut self, id: &str) -> VasariResult<()> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| SessionError::new(SessionErrorKind::StoreNotConfigured))?;
        let blob = store
            .load(id)
            .await?
            .ok_or_else(|| SessionError::new(SessionErrorKind::NotFound(id.to_string())))?;
        self.state = serde_json::from_slice(&blob).map_err(|e| {
            SessionError::new(SessionErrorKind::CorruptState(e.to_string()))
        })?;
        Ok(())
    }

    /// Export the book: outline plus approved chapters in order.
    ///
    /// # Errors
    ///
    /// Fails if no outline exists.
    pub fn export_book(&self) -> VasariResult<Book> {
        let outline = self
            .state
            .outline
            .as_ref()
            .ok_or_else(|| SessionError::new(SessionErrorKind::NoOutline))?;
        let chapters: Vec<ChapterContent> = self
            .state
            .chapters
            .values()
            .filter(|c| c.approved)
            .cloned()
            .collect();
        let metadata = BookMetadata::new(self.state.id.clone(), self.state.ledger.models());
        Ok(Book::new(
            outline.title().clone(),
            outline.clone(),
            chapters,
            self.state.ledger.total_cost(),
            metadata,
        ))
    }

    /// Cost entries recorded so far, in order.
    pub fn cost_entries(&self) -> Vec<vasari_core::CostEntry> {
        self.state.ledger.entries().to_vec()
    }

    fn pipeline(&self) -> ChapterPipeline<'_> {
        let mut pipeline = ChapterPipeline::new(
            &self.generator,
            &self.registry,
            &self.config,
            &self.classifier,
            &self.tracker,
            &self.pricing,
            &self.events,
        );
        if let Some(memory) = self.memory.as_deref() {
            pipeline = pipeline.with_memory(memory);
        }
        pipeline
    }

    /// Resolve the outline plan for a chapter, enforcing the approval gate.
    fn chapter_plan(&self, number: u32) -> VasariResult<vasari_core::ChapterPlan> {
        self.ensure_approved()?;
        let outline = self
            .state
            .outline
            .as_ref()
            .ok_or_else(|| SessionError::new(SessionErrorKind::NoOutline))?;
        outline
            .chapter(number)
            .cloned()
            .ok_or_else(|| vasari_error::OutlineError::new(
                vasari_error::OutlineErrorKind::UnknownChapter(number),
            ).into())
    }

    fn ensure_approved(&self) -> VasariResult<()> {
        if self.state.outline.is_none() {
            return Err(SessionError::new(SessionErrorKind::NoOutline).into());
        }
        if !self.state.outline_approved {
            return Err(SessionError::new(SessionErrorKind::OutlineNotApproved).into());
        }
        Ok(())
    }

    /// Whether `number` is the highest chapter with generated content.
    fn is_latest_generated(&self, number: u32) -> bool {
        self.state
            .chapters
            .keys()
            .next_back()
            .is_none_or(|last| *last <= number)
    }

    /// Record a finished (or failed) pipeline run into session state.
    fn absorb_outcome(
        &mut self,
        number: u32,
        result: VasariResult<crate::pipeline::ChapterOutcome>,
    ) -> VasariResult<ChapterContent> {
        match result {
            Ok(outcome) => {
                self.state.ledger.append(outcome.costs);
                // Regenerating an earlier chapter must not rewind the
                // rolling summary past later approved chapters.
                if self.is_latest_generated(number) {
                    self.state.continuity = outcome.continuity;
                }
                self.state.chapters.insert(number, outcome.content.clone());
                self.state.statuses.insert(number, ChapterStatus::Approved);
                Ok(outcome.content)
            }
            Err(e) => {
                self.state.statuses.insert(number, ChapterStatus::Failed);
                self.events.emit(SessionEvent::ChapterFailed {
                    number,
                    reason: e.to_string(),
                });
                tracing::error!(number, error = %e, "Chapter generation failed");
                Err(e)
            }
        }
    }
}
