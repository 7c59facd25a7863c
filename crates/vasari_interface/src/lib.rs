//! Collaborator trait definitions for the Vasari book generation engine.
//!
//! The engine consumes external capabilities through the traits defined
//! here and stays decoupled from their implementations:
//!
//! - [`TextGenerator`] - text and structured model generation
//! - [`CostModel`] - per-call cost lookup
//! - [`MemoryRecall`] - optional long-term memory retrieval
//! - [`SessionStore`] - optional opaque session persistence
//!
//! Model-role resolution is concrete rather than a trait: [`ModelRegistry`]
//! maps pipeline roles to configured [`ModelProfile`]s and fails with a
//! descriptive configuration error for unmapped roles.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod models;
mod store;
mod traits;

pub use models::{ModelProfile, ModelRegistry, ModelRole, PricingTable};
pub use store::FileSystemSessionStore;
pub use traits::{CostModel, MemoryContext, MemoryRecall, SessionStore, TextGenerator};
