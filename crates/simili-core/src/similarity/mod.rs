//! Similarity search: resolve a reference, classify the catalog, rank tiers.

mod classifier;
pub mod ranker;

pub use classifier::*;

use tracing::info;

use crate::catalog::Catalog;
use crate::config::SimilarityConfig;
use crate::models::{Resolution, TierResults};
use crate::resolver::Resolver;

/// Outcome of a successful search.
#[derive(Debug, Clone)]
pub struct SimilarityReport<'c> {
    /// The resolved reference
    pub reference: Resolution<'c>,
    /// Similar records by tier
    pub tiers: TierResults<'c>,
}

/// Main engine that coordinates resolution and classification.
pub struct SimilarityEngine {
    resolver: Resolver,
    classifier: Classifier,
    config: SimilarityConfig,
}

impl Default for SimilarityEngine {
    fn default() -> Self {
        Self::new(SimilarityConfig::default())
    }
}

impl SimilarityEngine {
    /// Create an engine from configuration.
    pub fn new(config: SimilarityConfig) -> Self {
        Self {
            resolver: Resolver::from_config(&config),
            classifier: Classifier::new(config.ingredient_match),
            config,
        }
    }

    /// Create an engine with a custom resolver.
    pub fn with_resolver(config: SimilarityConfig, resolver: Resolver) -> Self {
        Self {
            resolver,
            classifier: Classifier::new(config.ingredient_match),
            config,
        }
    }

    /// Resolve `query` and group the rest of the catalog around it.
    ///
    /// Returns `None` when the query is empty or matches nothing.
    pub fn search<'c>(&self, catalog: &'c Catalog, query: &str) -> Option<SimilarityReport<'c>> {
        let reference = self.resolver.resolve(catalog, query)?;
        let mut tiers = self.classifier.classify(catalog, reference.record);

        if let Some(limit) = self.config.max_results_per_tier {
            tiers.truncate(limit);
        }

        info!(
            query = query.trim(),
            reference = reference.record.brand_name(),
            sizes = ?tiers.total_sizes(),
            "Similarity search complete"
        );
        Some(SimilarityReport { reference, tiers })
    }

    /// Brands to suggest for an empty query.
    pub fn suggestions(&self, catalog: &Catalog) -> Vec<String> {
        catalog.suggestions(self.config.suggestion_limit)
    }

    /// Get the resolver for direct access.
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Get the classifier for direct access.
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }
}
