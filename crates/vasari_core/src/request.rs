//! Request and response types for model generation calls.

use serde::{Deserialize, Serialize};

use crate::usage::TokenUsage;

/// A plain-text generation request.
///
/// # Examples
///
/// ```
/// use vasari_core::GenerationRequest;
///
/// let request = GenerationRequest::builder()
///     .system("You are a novelist.")
///     .prompt("Write the opening scene.")
///     .temperature(0.8f32)
///     .max_tokens(4096u32)
///     .model("prose-large")
///     .build()
///     .unwrap();
///
/// assert_eq!(request.max_tokens, Some(4096));
/// ```
#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, Default, derive_builder::Builder,
)]
#[builder(setter(into, strip_option), default)]
pub struct GenerationRequest {
    /// Optional system instruction.
    pub system: Option<String>,
    /// The user prompt.
    pub prompt: String,
    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0.0 to 1.0).
    pub temperature: Option<f32>,
    /// Model identifier to use.
    pub model: Option<String>,
}

impl GenerationRequest {
    /// Start building a request.
    pub fn builder() -> GenerationRequestBuilder {
        GenerationRequestBuilder::default()
    }
}

/// Response to a plain-text generation request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// The generated text.
    pub text: String,
    /// Token usage reported by the provider.
    pub usage: TokenUsage,
}

/// A structured-output generation request.
///
/// The schema is passed through to the driver verbatim; validation and
/// default application happen on the provider side.
#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, Default, derive_builder::Builder,
)]
#[builder(setter(into, strip_option), default)]
pub struct StructuredRequest {
    /// Optional system instruction.
    pub system: Option<String>,
    /// The user prompt.
    pub prompt: String,
    /// JSON schema the output object must conform to.
    pub schema: serde_json::Value,
    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0.0 to 1.0).
    pub temperature: Option<f32>,
    /// Model identifier to use.
    pub model: Option<String>,
}

impl StructuredRequest {
    /// Start building a request.
    pub fn builder() -> StructuredRequestBuilder {
        StructuredRequestBuilder::default()
    }
}

/// Response to a structured-output generation request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StructuredResponse {
    /// The validated output object.
    pub object: serde_json::Value,
    /// Token usage reported by the provider.
    pub usage: TokenUsage,
}
