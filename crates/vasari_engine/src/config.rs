//! Engine configuration.

use serde::{Deserialize, Serialize};
use vasari_error::{ConfigError, VasariResult};

/// Tunable limits for the chapter pipeline.
///
/// All bounds are hard: the refusal-retry and expand loops terminate after
/// their configured attempt counts regardless of model behavior, which is
/// the engine's only bound against unbounded cost.
///
/// # Examples
///
/// ```
/// use vasari_engine::EngineConfig;
///
/// let config = EngineConfig::builder()
///     .word_tolerance(0.2)
///     .max_edit_cycles(2)
///     .build();
///
/// assert_eq!(*config.max_edit_cycles(), 2);
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Acceptable shortfall below the chapter word target (0.0 to <1.0).
    #[serde(default = "default_word_tolerance")]
    word_tolerance: f32,

    /// Retries after a refusal classification, beyond the first attempt.
    #[serde(default = "default_three")]
    max_refusal_retries: u32,

    /// Iterations of the expand loop per chapter.
    #[serde(default = "default_three")]
    max_expand_attempts: u32,

    /// Editorial cycles before approval is forced.
    #[serde(default = "default_three")]
    max_edit_cycles: u32,

    /// Minimum words a salvaged draft must have to be kept.
    #[serde(default = "default_min_salvage_words")]
    min_salvage_words: usize,

    /// Word cap on the rolling summary.
    #[serde(default = "default_summary_word_cap")]
    summary_word_cap: usize,

    /// Characters of chapter tail kept as the ending bridge.
    #[serde(default = "default_ending_bridge_chars")]
    ending_bridge_chars: usize,

    /// Token budget for the assembled writer context.
    #[serde(default = "default_context_budget")]
    context_budget_tokens: usize,

    /// Floor on the token allowance handed to an expansion call.
    #[serde(default = "default_min_expand_tokens")]
    min_expand_tokens: u32,
}

fn default_word_tolerance() -> f32 {
    0.15
}

fn default_three() -> u32 {
    3
}

fn default_min_salvage_words() -> usize {
    100
}

fn default_summary_word_cap() -> usize {
    2_000
}

fn default_ending_bridge_chars() -> usize {
    2_000
}

fn default_context_budget() -> usize {
    6_000
}

fn default_min_expand_tokens() -> u32 {
    4_096
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            word_tolerance: default_word_tolerance(),
            max_refusal_retries: default_three(),
            max_expand_attempts: default_three(),
            max_edit_cycles: default_three(),
            min_salvage_words: default_min_salvage_words(),
            summary_word_cap: default_summary_word_cap(),
            ending_bridge_chars: default_ending_bridge_chars(),
            context_budget_tokens: default_context_budget(),
            min_expand_tokens: default_min_expand_tokens(),
        }
    }
}

impl EngineConfig {
    /// Creates a new config builder.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Parse a config from TOML, applying defaults for absent fields.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for malformed TOML or out-of-range
    /// values.
    pub fn from_toml_str(content: &str) -> VasariResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("failed to parse engine config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates that all settings are in usable ranges.
    ///
    /// # Errors
    ///
    /// Returns an error naming the offending field.
    pub fn validate(&self) -> VasariResult<()> {
        if !(0.0..1.0).contains(&self.word_tolerance) {
            return Err(ConfigError::new(format!(
                "word_tolerance must be in [0.0, 1.0), got {}",
                self.word_tolerance
            ))
            .into());
        }
        if self.max_edit_cycles == 0 {
            return Err(ConfigError::new("max_edit_cycles must be at least 1").into());
        }
        if self.max_expand_attempts == 0 {
            return Err(ConfigError::new("max_expand_attempts must be at least 1").into());
        }
        if self.summary_word_cap == 0 {
            return Err(ConfigError::new("summary_word_cap must be at least 1").into());
        }
        Ok(())
    }

    /// Lowest acceptable word count for a chapter target.
    pub fn word_floor(&self, target: u32) -> usize {
        (target as f32 * (1.0 - self.word_tolerance)).floor() as usize
    }
}

/// Builder for `EngineConfig`.
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    word_tolerance: Option<f32>,
    max_refusal_retries: Option<u32>,
    max_expand_attempts: Option<u32>,
    max_edit_cycles: Option<u32>,
    min_salvage_words: Option<usize>,
    summary_word_cap: Option<usize>,
    ending_bridge_chars: Option<usize>,
    context_budget_tokens: Option<usize>,
    min_expand_tokens: Option<u32>,
}

impl EngineConfigBuilder {
    /// Sets the word tolerance.
    pub fn word_tolerance(mut self, value: f32) -> Self {
        self.word_tolerance = Some(value);
        self
    }

    /// Sets the refusal retry cap.
    pub fn max_refusal_retries(mut self, value: u32) -> Self {
        self.max_refusal_retries = Some(value);
        self
    }

    /// Sets the expand attempt cap.
    pub fn max_expand_attempts(mut self, value: u32) -> Self {
        self.max_expand_attempts = Some(value);
        self
    }

    /// Sets the edit cycle cap.
    pub fn max_edit_cycles(mut self, value: u32) -> Self {
        self.max_edit_cycles = Some(value);
        self
    }

    /// Sets the minimum salvage word count.
    pub fn min_salvage_words(mut self, value: usize) -> Self {
        self.min_salvage_words = Some(value);
        self
    }

    /// Sets the rolling summary word cap.
    pub fn summary_word_cap(mut self, value: usize) -> Self {
        self.summary_word_cap = Some(value);
        self
    }

    /// Sets the ending bridge length in characters.
    pub fn ending_bridge_chars(mut self, value: usize) -> Self {
        self.ending_bridge_chars = Some(value);
        self
    }

    /// Sets the writer context token budget.
    pub fn context_budget_tokens(mut self, value: usize) -> Self {
        self.context_budget_tokens = Some(value);
        self
    }

    /// Sets the expansion token floor.
    pub fn min_expand_tokens(mut self, value: u32) -> Self {
        self.min_expand_tokens = Some(value);
        self
    }

    /// Builds the `EngineConfig`.
    pub fn build(self) -> EngineConfig {
        let defaults = EngineConfig::default();
        EngineConfig {
            word_tolerance: self.word_tolerance.unwrap_or(defaults.word_tolerance),
            max_refusal_retries: self
                .max_refusal_retries
                .unwrap_or(defaults.max_refusal_retries),
            max_expand_attempts: self
                .max_expand_attempts
                .unwrap_or(defaults.max_expand_attempts),
            max_edit_cycles: self.max_edit_cycles.unwrap_or(defaults.max_edit_cycles),
            min_salvage_words: self.min_salvage_words.unwrap_or(defaults.min_salvage_words),
            summary_word_cap: self.summary_word_cap.unwrap_or(defaults.summary_word_cap),
            ending_bridge_chars: self
                .ending_bridge_chars
                .unwrap_or(defaults.ending_bridge_chars),
            context_budget_tokens: self
                .context_budget_tokens
                .unwrap_or(defaults.context_budget_tokens),
            min_expand_tokens: self.min_expand_tokens.unwrap_or(defaults.min_expand_tokens),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn word_floor_uses_tolerance() {
        let config = EngineConfig::default();
        assert_eq!(config.word_floor(1_000), 850);
    }

    #[test]
    fn rejects_out_of_range_tolerance() {
        let config = EngineConfig::builder().word_tolerance(1.5).build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_partial_toml() {
        let config = EngineConfig::from_toml_str("max_edit_cycles = 5\n").unwrap();
        assert_eq!(*config.max_edit_cycles(), 5);
        assert_eq!(*config.summary_word_cap(), 2_000);
    }
}
