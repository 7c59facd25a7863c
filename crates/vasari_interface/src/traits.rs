//! Trait definitions for the engine's external collaborators.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use vasari_core::{GenerationRequest, GenerationResponse, StructuredRequest, StructuredResponse, TokenUsage};
use vasari_error::VasariResult;

/// Core trait every generation backend must implement.
///
/// Implementations wrap a concrete provider and are expected to propagate
/// provider errors rather than swallowing them; the engine decides whether
/// a failure is fatal for the chapter.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate plain text for a prompt.
    async fn generate(&self, req: &GenerationRequest) -> VasariResult<GenerationResponse>;

    /// Generate an object conforming to the request's JSON schema.
    ///
    /// Schema validation and default application happen behind this call;
    /// the engine treats the returned object as already validated.
    async fn generate_structured(&self, req: &StructuredRequest) -> VasariResult<StructuredResponse>;

    /// Provider name (e.g. "anthropic", "openai", "gemini").
    fn provider_name(&self) -> &'static str;
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for Arc<T> {
    async fn generate(&self, req: &GenerationRequest) -> VasariResult<GenerationResponse> {
        (**self).generate(req).await
    }

    async fn generate_structured(&self, req: &StructuredRequest) -> VasariResult<StructuredResponse> {
        (**self).generate_structured(req).await
    }

    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }
}

/// Computes the cost of a completed call.
pub trait CostModel: Send + Sync {
    /// Cost in USD for `usage` against `model_id`.
    ///
    /// Unknown models cost 0.0 rather than failing.
    fn cost(&self, model_id: &str, usage: &TokenUsage) -> f64;
}

/// Context retrieved from long-term memory for a chapter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MemoryContext {
    /// Relevant prose passages from earlier chapters.
    #[serde(default)]
    pub passages: Vec<String>,
    /// Current character state notes.
    #[serde(default)]
    pub character_states: Vec<String>,
    /// Recent plot events worth keeping in view.
    #[serde(default)]
    pub recent_events: Vec<String>,
}

impl MemoryContext {
    /// Whether nothing was retrieved.
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty() && self.character_states.is_empty() && self.recent_events.is_empty()
    }

    /// Render the context as plain text for prompt inclusion.
    pub fn as_context(&self) -> String {
        let mut sections = Vec::new();
        if !self.passages.is_empty() {
            sections.push(format!("Relevant passages:\n{}", self.passages.join("\n")));
        }
        if !self.character_states.is_empty() {
            sections.push(format!(
                "Character states:\n{}",
                self.character_states.join("\n")
            ));
        }
        if !self.recent_events.is_empty() {
            sections.push(format!("Recent events:\n{}", self.recent_events.join("\n")));
        }
        sections.join("\n\n")
    }
}

/// Optional long-term memory retrieval.
///
/// Failures are treated as "no context available" by the engine; a memory
/// backend outage never fails a chapter.
#[async_trait]
pub trait MemoryRecall: Send + Sync {
    /// Retrieve context relevant to a query for the given chapter.
    async fn relevant_context(&self, query: &str, chapter: u32) -> VasariResult<MemoryContext>;
}

/// Optional opaque session persistence.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a serialized session blob under an id.
    async fn save(&self, id: &str, blob: &[u8]) -> VasariResult<()>;

    /// Load a previously saved blob, or `None` if the id is unknown.
    async fn load(&self, id: &str) -> VasariResult<Option<Vec<u8>>>;
}
