//! Top-level error wrapper types.

use crate::{ConfigError, GenerationError, OutlineError, SessionError};

/// This is the foundation error enum for the Vasari workspace.
///
/// # Examples
///
/// ```
/// use vasari_error::{VasariError, ConfigError};
///
/// let cfg_err = ConfigError::new("missing role mapping");
/// let err: VasariError = cfg_err.into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum VasariErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Model generation call error
    #[from(GenerationError)]
    Generation(GenerationError),
    /// Outline structural edit error
    #[from(OutlineError)]
    Outline(OutlineError),
    /// Session lifecycle error
    #[from(SessionError)]
    Session(SessionError),
}

/// Vasari error with kind discrimination.
///
/// # Examples
///
/// ```
/// use vasari_error::{VasariResult, SessionError, SessionErrorKind};
///
/// fn might_fail() -> VasariResult<()> {
///     Err(SessionError::new(SessionErrorKind::NoOutline))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Vasari Error: {}", _0)]
pub struct VasariError(Box<VasariErrorKind>);

impl VasariError {
    /// Create a new error from a kind.
    pub fn new(kind: VasariErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &VasariErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to VasariErrorKind
impl<T> From<T> for VasariError
where
    T: Into<VasariErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Vasari operations.
///
/// # Examples
///
/// ```
/// use vasari_error::{VasariResult, ConfigError};
///
/// fn load_registry() -> VasariResult<String> {
///     Err(ConfigError::new("registry file not found"))?
/// }
/// ```
pub type VasariResult<T> = std::result::Result<T, VasariError>;
