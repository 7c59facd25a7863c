//! Model role resolution and pricing.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vasari_core::TokenUsage;
use vasari_error::{ConfigError, VasariResult};

use crate::traits::CostModel;

/// Pipeline roles that resolve to configured models.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ModelRole {
    /// Outline generation and regeneration.
    Outline,
    /// Detailed chapter planning.
    Planning,
    /// Prose writing and expansion.
    Writing,
    /// Editorial scoring.
    Editing,
    /// Rolling summary maintenance.
    Continuity,
}

/// A configured model handle: identifier plus call parameters and pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct ModelProfile {
    /// Provider model identifier.
    id: String,
    /// Sampling temperature for this role.
    #[serde(default)]
    temperature: Option<f32>,
    /// Output token ceiling for this role.
    #[serde(default)]
    max_tokens: Option<u32>,
    /// USD per million prompt tokens.
    #[serde(default)]
    prompt_price: f64,
    /// USD per million completion tokens.
    #[serde(default)]
    completion_price: f64,
}

impl ModelProfile {
    /// Create a profile.
    pub fn new(
        id: impl Into<String>,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
        prompt_price: f64,
        completion_price: f64,
    ) -> Self {
        Self {
            id: id.into(),
            temperature,
            max_tokens,
            prompt_price,
            completion_price,
        }
    }
}

/// Maps pipeline roles to configured model profiles.
///
/// # Examples
///
/// ```
/// use vasari_interface::{ModelProfile, ModelRegistry, ModelRole};
///
/// let registry = ModelRegistry::new()
///     .with_role(ModelRole::Writing, ModelProfile::new("prose-large", Some(0.8), Some(8192), 3.0, 15.0));
///
/// assert!(registry.resolve(ModelRole::Writing).is_ok());
/// assert!(registry.resolve(ModelRole::Editing).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelRegistry {
    roles: HashMap<ModelRole, ModelProfile>,
}

impl ModelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the profile for a role.
    pub fn with_role(mut self, role: ModelRole, profile: ModelProfile) -> Self {
        self.roles.insert(role, profile);
        self
    }

    /// Parse a registry from TOML.
    ///
    /// ```toml
    /// [writing]
    /// id = "prose-large"
    /// temperature = 0.8
    /// max_tokens = 8192
    /// prompt_price = 3.0
    /// completion_price = 15.0
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a configuration error for malformed TOML or unknown role
    /// names.
    pub fn from_toml_str(content: &str) -> VasariResult<Self> {
        let raw: HashMap<String, ModelProfile> = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("failed to parse model registry: {e}")))?;
        let mut roles = HashMap::new();
        for (name, profile) in raw {
            let role = ModelRole::from_str(&name)
                .map_err(|_| ConfigError::new(format!("unknown model role `{name}`")))?;
            roles.insert(role, profile);
        }
        Ok(Self { roles })
    }

    /// Resolve a role to its configured profile.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the role when no model is
    /// configured for it.
    pub fn resolve(&self, role: ModelRole) -> VasariResult<&ModelProfile> {
        self.roles
            .get(&role)
            .ok_or_else(|| ConfigError::new(format!("no model configured for role `{role}`")).into())
    }

    /// All configured profiles.
    pub fn profiles(&self) -> impl Iterator<Item = &ModelProfile> {
        self.roles.values()
    }
}

/// Cost model backed by the registry's per-profile pricing.
///
/// Unknown model ids cost 0.0; the ledger records the call either way.
#[derive(Debug, Clone, Default)]
pub struct PricingTable {
    prices: HashMap<String, (f64, f64)>,
}

impl PricingTable {
    /// Build a pricing table from a registry's profiles.
    pub fn from_registry(registry: &ModelRegistry) -> Self {
        let prices = registry
            .profiles()
            .map(|p| (p.id().clone(), (*p.prompt_price(), *p.completion_price())))
            .collect();
        Self { prices }
    }
}

impl CostModel for PricingTable {
    fn cost(&self, model_id: &str, usage: &TokenUsage) -> f64 {
        match self.prices.get(model_id) {
            Some((prompt, completion)) => usage.calculate_cost(*prompt, *completion),
            None => 0.0,
        }
    }
}
