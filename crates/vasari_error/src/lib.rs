//! Error types for the Vasari library.
//!
//! This crate provides the foundation error types used throughout the Vasari
//! workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use vasari_error::{VasariResult, ConfigError};
//!
//! fn resolve_model() -> VasariResult<String> {
//!     Err(ConfigError::new("no model configured for role `writing`"))?
//! }
//!
//! match resolve_model() {
//!     Ok(model) => println!("Using: {}", model),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod generation;
mod outline;
mod session;

pub use config::ConfigError;
pub use error::{VasariError, VasariErrorKind, VasariResult};
pub use generation::{GenerationError, GenerationErrorKind};
pub use outline::{OutlineError, OutlineErrorKind};
pub use session::{SessionError, SessionErrorKind};
