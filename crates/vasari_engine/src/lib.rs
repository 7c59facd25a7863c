//! Chapter generation orchestration engine.
//!
//! This crate is the core of Vasari: the state machine that sequences
//! plan → write → expand → edit → continuity steps per chapter, the
//! refusal-detection-and-retry protocol, the word-count enforcement loop,
//! the priority-based token-budget context assembler, and the rolling
//! continuity mechanism.
//!
//! # Architecture
//!
//! - [`RefusalClassifier`] - decides whether model output is a refusal and
//!   extracts salvageable prose
//! - [`budget`] - greedy, priority-ordered context packing
//! - [`ContinuityTracker`] - bounded rolling summary and ending bridge
//! - [`CostLedger`] - append-only per-call cost accounting
//! - [`ChapterPipeline`] - the per-chapter state machine
//! - [`SessionController`] - drives the pipeline across an outline
//!
//! The engine talks to the outside world only through the collaborator
//! traits in `vasari_interface`; provider wire calls, schema validation,
//! vector storage, and persistence all live behind those seams.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod budget;
mod config;
mod continuity;
mod events;
mod ledger;
mod pipeline;
pub mod prompts;
mod refusal;
mod session;

pub use config::{EngineConfig, EngineConfigBuilder};
pub use continuity::{ContinuityState, ContinuityTracker};
pub use events::EventBus;
pub use ledger::CostLedger;
pub use pipeline::{ChapterOutcome, ChapterPipeline, PipelinePhase};
pub use prompts::RewriteDirective;
pub use refusal::{Classification, RefusalClassifier};
pub use session::{SessionController, SessionState};
