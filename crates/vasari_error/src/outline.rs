//! Outline structural edit error types.

/// Specific error conditions for outline structural edits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum OutlineErrorKind {
    /// Referenced chapter number does not exist in the outline
    #[display("Chapter {} does not exist in the outline", _0)]
    UnknownChapter(u32),
    /// Merging requires two adjacent chapters
    #[display("Cannot merge chapters {} and {}: not adjacent", first, second)]
    NonAdjacentMerge {
        /// First chapter number
        first: u32,
        /// Second chapter number
        second: u32,
    },
    /// Edit would leave the outline without any chapters
    #[display("Edit would remove every chapter from the outline")]
    EmptyOutline,
    /// Insertion position is out of range
    #[display("Position {} is out of range for an outline of {} chapters", position, len)]
    PositionOutOfRange {
        /// Requested 1-based position
        position: u32,
        /// Current chapter count
        len: usize,
    },
}

/// Error type for outline structural edits.
///
/// # Examples
///
/// ```
/// use vasari_error::{OutlineError, OutlineErrorKind};
///
/// let err = OutlineError::new(OutlineErrorKind::UnknownChapter(7));
/// assert!(format!("{}", err).contains("Chapter 7"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Outline Error: {} at line {} in {}", kind, line, file)]
pub struct OutlineError {
    /// The specific error condition
    pub kind: OutlineErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl OutlineError {
    /// Create a new OutlineError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: OutlineErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
