//! Similarity search configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resolver::MatcherKind;
use crate::similarity::IngredientMatch;

/// Minimum scorer result (0-100) for a fuzzy reference match.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 75.0;

/// Records shown per tier.
pub const DEFAULT_MAX_RESULTS_PER_TIER: usize = 200;

/// Brands suggested for an empty query.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 12;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Tunables of the resolver, classifier and result presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Fuzzy acceptance threshold (0-100)
    pub fuzzy_threshold: f64,
    /// Cap applied to each tier list; `None` keeps everything
    pub max_results_per_tier: Option<usize>,
    /// How ingredient sets are compared for tiers B and C
    pub ingredient_match: IngredientMatch,
    /// Approximate matcher used by the resolver
    pub matcher: MatcherKind,
    /// Number of brands suggested when the query is empty
    pub suggestion_limit: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            max_results_per_tier: Some(DEFAULT_MAX_RESULTS_PER_TIER),
            ingredient_match: IngredientMatch::default(),
            matcher: MatcherKind::default(),
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
        }
    }
}

impl SimilarityConfig {
    /// Parse a JSON config. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check value ranges.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(0.0..=100.0).contains(&self.fuzzy_threshold) {
            return Err(ConfigError::Invalid(format!(
                "fuzzy_threshold must be within 0-100, got {}",
                self.fuzzy_threshold
            )));
        }
        Ok(())
    }
}
