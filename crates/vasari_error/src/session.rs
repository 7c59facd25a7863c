//! Session lifecycle error types.

/// Specific error conditions for session operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum SessionErrorKind {
    /// No outline has been generated yet
    #[display("No outline exists; generate an outline first")]
    NoOutline,
    /// Chapter operations require an approved outline
    #[display("Outline has not been approved; call approve_outline before generating chapters")]
    OutlineNotApproved,
    /// Structural edits are rejected once the outline is approved
    #[display("Outline is approved and locked; regenerate it to restructure")]
    OutlineLocked,
    /// Requested chapter has no generated content
    #[display("Chapter {} has not been generated", _0)]
    ChapterNotGenerated(u32),
    /// Operation requires an approved chapter
    #[display("Chapter {} is not approved", _0)]
    ChapterNotApproved(u32),
    /// Save/restore requested without a configured store
    #[display("No session store is configured")]
    StoreNotConfigured,
    /// Underlying store failure
    #[display("Session store failed: {}", _0)]
    StoreFailed(String),
    /// Persisted state could not be decoded
    #[display("Failed to decode session state: {}", _0)]
    CorruptState(String),
    /// No saved state exists under the requested id
    #[display("No saved session found for id `{}`", _0)]
    NotFound(String),
}

/// Error type for session operations.
///
/// # Examples
///
/// ```
/// use vasari_error::{SessionError, SessionErrorKind};
///
/// let err = SessionError::new(SessionErrorKind::OutlineNotApproved);
/// assert!(format!("{}", err).contains("approved"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Session Error: {} at line {} in {}", kind, line, file)]
pub struct SessionError {
    /// The specific error condition
    pub kind: SessionErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl SessionError {
    /// Create a new SessionError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: SessionErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
