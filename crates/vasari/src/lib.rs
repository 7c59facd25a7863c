//! Vasari - long-form book generation driven by staged LLM calls.
//!
//! Vasari generates long-form documents (novels, technical guides,
//! courses) by driving a sequence of model calls through a multi-stage
//! pipeline: it enforces length targets, detects and recovers from model
//! refusals, and maintains narrative continuity across chapters.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vasari::{
//!     EngineConfig, FileSystemSessionStore, ModelRegistry, OutlineBrief, SessionController,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     vasari::observability::init_tracing()?;
//!
//!     let registry = ModelRegistry::from_toml_str(&std::fs::read_to_string("models.toml")?)?;
//!     let store = Arc::new(FileSystemSessionStore::new("./sessions")?);
//!     let mut session =
//!         SessionController::new(my_driver, registry, EngineConfig::default())?
//!             .with_store(store);
//!
//!     let brief = OutlineBrief::new(
//!         "The Cartographer's Debt",
//!         "A mapmaker discovers her maps rewrite the places they describe.",
//!         "Adult fantasy readers",
//!         vec!["obligation".into(), "memory".into()],
//!         12,
//!         3_000,
//!     );
//!     session.generate_outline(&brief).await?;
//!     session.approve_outline()?;
//!     session.generate_chapter(1).await?;
//!     println!("{:?}", session.progress());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! Vasari is organized as a workspace with focused crates:
//!
//! - `vasari_core` - core data types (outline, plans, content, events)
//! - `vasari_interface` - collaborator traits (generation, memory, storage)
//! - `vasari_error` - error types
//! - `vasari_engine` - the chapter pipeline and session controller
//!
//! This crate (`vasari`) re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod observability;

pub use vasari_core::{
    Book, BookMetadata, ChapterContent, ChapterPlan, ChapterStatus, CharacterProfile, CostEntry,
    DetailedChapterPlan, EditResult, EventSink, GenerationRequest, GenerationResponse, Outline,
    OutlineBrief, OutlineEdit, Progress, ScenePlan, SessionEvent, StructuredRequest,
    StructuredResponse, TokenUsage,
};
pub use vasari_engine::{
    budget, ChapterOutcome, ChapterPipeline, Classification, ContinuityState, ContinuityTracker,
    CostLedger, EngineConfig, EventBus, PipelinePhase, RefusalClassifier, RewriteDirective,
    SessionController,
};
pub use vasari_error::{
    ConfigError, GenerationError, GenerationErrorKind, OutlineError, OutlineErrorKind,
    SessionError, SessionErrorKind, VasariError, VasariErrorKind, VasariResult,
};
pub use vasari_interface::{
    CostModel, FileSystemSessionStore, MemoryContext, MemoryRecall, ModelProfile, ModelRegistry,
    ModelRole, PricingTable, SessionStore, TextGenerator,
};
