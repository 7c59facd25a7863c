//! Generation call error types.

/// Specific error conditions for model generation calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum GenerationErrorKind {
    /// Provider or network failure reported by the driver
    #[display("Provider call failed: {}", _0)]
    Provider(String),
    /// The model returned an empty response body
    #[display("Model returned an empty response for step `{}`", _0)]
    EmptyResponse(String),
    /// Structured output could not be decoded into the expected type
    #[display("Failed to decode structured output for step `{}`: {}", step, message)]
    MalformedStructuredOutput {
        /// Pipeline step that issued the call
        step: String,
        /// Decode error message
        message: String,
    },
    /// Request construction failed before the call was issued
    #[display("Failed to build generation request: {}", _0)]
    RequestBuild(String),
}

/// Error type for model generation calls.
///
/// Generation errors propagate as hard chapter failures: the affected
/// chapter is marked failed and the session moves on to the next one.
///
/// # Examples
///
/// ```
/// use vasari_error::{GenerationError, GenerationErrorKind};
///
/// let err = GenerationError::new(GenerationErrorKind::Provider("timeout".into()));
/// assert!(format!("{}", err).contains("timeout"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Generation Error: {} at line {} in {}", kind, line, file)]
pub struct GenerationError {
    /// The specific error condition
    pub kind: GenerationErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl GenerationError {
    /// Create a new GenerationError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GenerationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
