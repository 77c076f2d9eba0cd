//! Reference resolver for free-text queries.
//!
//! Pipeline: brand prefix → fuzzy brand → fuzzy ingredients → brand containment.
//! The first strategy that finds a record wins.

mod matcher;
mod normalizer;

pub use matcher::*;
pub use normalizer::*;

use tracing::debug;

use crate::catalog::Catalog;
use crate::config::SimilarityConfig;
use crate::models::{MatchStrategy, MedicationRecord, Resolution};

/// Resolves a query to the single catalog record used as similarity anchor.
pub struct Resolver {
    matcher: Box<dyn ApproximateMatcher>,
    threshold: f64,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::from_config(&SimilarityConfig::default())
    }
}

impl Resolver {
    /// Create a resolver with an explicit matcher and acceptance threshold.
    pub fn new(matcher: Box<dyn ApproximateMatcher>, threshold: f64) -> Self {
        Self { matcher, threshold }
    }

    /// Create a resolver from configuration.
    pub fn from_config(config: &SimilarityConfig) -> Self {
        Self::new(config.matcher.build(), config.fuzzy_threshold)
    }

    /// Get the matcher for direct access.
    pub fn matcher(&self) -> &dyn ApproximateMatcher {
        self.matcher.as_ref()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Find the reference record for a query.
    ///
    /// Returns `None` for an empty query or when no strategy matches.
    pub fn resolve<'c>(&self, catalog: &'c Catalog, query: &str) -> Option<Resolution<'c>> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        let key = brand_key(query);

        let resolution = self
            .by_brand_prefix(catalog, &key)
            .or_else(|| {
                self.by_fuzzy(
                    catalog,
                    query,
                    MatchStrategy::BrandFuzzy,
                    MedicationRecord::brand_name,
                )
            })
            .or_else(|| {
                self.by_fuzzy(
                    catalog,
                    query,
                    MatchStrategy::IngredientFuzzy,
                    MedicationRecord::active_ingredients,
                )
            })
            .or_else(|| self.by_brand_contains(catalog, &key));

        match &resolution {
            Some(found) => debug!(
                query,
                brand = found.record.brand_name(),
                strategy = ?found.strategy,
                score = ?found.score,
                "Resolved reference"
            ),
            None => debug!(query, matcher = self.matcher.name(), "No reference found"),
        }
        resolution
    }

    /// First record whose brand key starts with the query key.
    fn by_brand_prefix<'c>(&self, catalog: &'c Catalog, key: &str) -> Option<Resolution<'c>> {
        find_first(catalog, MatchStrategy::BrandPrefix, |record| {
            record.brand_key().starts_with(key)
        })
    }

    /// Best fuzzy match on one text field, if it clears the threshold.
    fn by_fuzzy<'c>(
        &self,
        catalog: &'c Catalog,
        query: &str,
        strategy: MatchStrategy,
        field: fn(&MedicationRecord) -> &str,
    ) -> Option<Resolution<'c>> {
        let choices: Vec<&str> = catalog.iter().map(field).collect();
        let best = self.matcher.extract_one(query, &choices)?;
        if best.score < self.threshold {
            return None;
        }

        let record = catalog.get(best.index)?;
        Some(Resolution {
            record,
            index: best.index,
            strategy,
            score: Some(best.score),
        })
    }

    /// First record whose brand key contains the query key.
    fn by_brand_contains<'c>(&self, catalog: &'c Catalog, key: &str) -> Option<Resolution<'c>> {
        find_first(catalog, MatchStrategy::BrandContains, |record| {
            record.brand_key().contains(key)
        })
    }
}

fn find_first<'c>(
    catalog: &'c Catalog,
    strategy: MatchStrategy,
    predicate: impl Fn(&MedicationRecord) -> bool,
) -> Option<Resolution<'c>> {
    catalog
        .iter()
        .enumerate()
        .find(|(_, record)| predicate(*record))
        .map(|(index, record)| Resolution {
            record,
            index,
            strategy,
            score: None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawRecord;

    /// Matcher returning fixed scores for known choices and 0 otherwise.
    struct FixedScores(Vec<(&'static str, f64)>);

    impl ApproximateMatcher for FixedScores {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn score(&self, _query: &str, choice: &str) -> Option<f64> {
            let score = self
                .0
                .iter()
                .find(|(known, _)| *known == choice)
                .map_or(0.0, |(_, score)| *score);
            Some(score)
        }
    }

    fn fixed_resolver(scores: Vec<(&'static str, f64)>) -> Resolver {
        Resolver::new(Box::new(FixedScores(scores)), 75.0)
    }

    fn scored_catalog() -> Catalog {
        Catalog::from_records(vec![
            RawRecord::new("ALPHA", "Zinc"),
            RawRecord::new("BETA", "Magnésium"),
        ])
    }

    fn setup_catalog() -> Catalog {
        Catalog::from_records(vec![
            RawRecord::new("EFFERALGAN 1 G", "Paracétamol"),
            RawRecord::new("DOLIPRANE 500 MG", "Paracétamol"),
            RawRecord::new("DOLIPRANE 1000 MG", "Paracétamol"),
            RawRecord::new("AUGMENTIN 1 G", "Amoxicilline | Acide clavulanique"),
            RawRecord::new("Zyrtec", "Cétirizine"),
        ])
    }

    #[test]
    fn test_resolve_by_prefix() {
        let catalog = setup_catalog();
        let resolver = Resolver::default();

        let found = resolver.resolve(&catalog, "doliprane").unwrap();
        assert_eq!(found.record.brand_name(), "DOLIPRANE 500 MG");
        assert_eq!(found.index, 1);
        assert_eq!(found.strategy, MatchStrategy::BrandPrefix);
        assert_eq!(found.score, None);
    }

    #[test]
    fn test_prefix_ignores_case_and_accents() {
        let catalog = Catalog::from_records(vec![RawRecord::new("Ézéprane", "x")]);
        let found = Resolver::default().resolve(&catalog, "EZEP").unwrap();
        assert_eq!(found.strategy, MatchStrategy::BrandPrefix);
    }

    #[test]
    fn test_resolve_by_fuzzy_brand() {
        let catalog = setup_catalog();
        let found = Resolver::default().resolve(&catalog, "dolipranne").unwrap();
        assert_eq!(found.record.brand_name(), "DOLIPRANE 500 MG");
        assert_eq!(found.strategy, MatchStrategy::BrandFuzzy);
        assert!(found.score.unwrap() >= 75.0);
    }

    #[test]
    fn test_resolve_by_fuzzy_ingredient() {
        let catalog = setup_catalog();
        let found = Resolver::default().resolve(&catalog, "cetirizine").unwrap();
        assert_eq!(found.record.brand_name(), "Zyrtec");
        assert_eq!(found.strategy, MatchStrategy::IngredientFuzzy);
    }

    #[test]
    fn test_resolve_by_containment_without_matcher() {
        let catalog = setup_catalog();
        let resolver = Resolver::new(Box::new(DisabledMatcher), 75.0);

        let found = resolver.resolve(&catalog, "1000").unwrap();
        assert_eq!(found.record.brand_name(), "DOLIPRANE 1000 MG");
        assert_eq!(found.strategy, MatchStrategy::BrandContains);
    }

    #[test]
    fn test_disabled_matcher_still_prefix_matches() {
        let catalog = setup_catalog();
        let resolver = Resolver::new(Box::new(DisabledMatcher), 75.0);
        let found = resolver.resolve(&catalog, "augm").unwrap();
        assert_eq!(found.strategy, MatchStrategy::BrandPrefix);

        assert!(resolver.resolve(&catalog, "cetirizine").is_none());
    }

    #[test]
    fn test_empty_query() {
        let catalog = setup_catalog();
        let resolver = Resolver::default();
        assert!(resolver.resolve(&catalog, "").is_none());
        assert!(resolver.resolve(&catalog, "   ").is_none());
    }

    #[test]
    fn test_no_reference() {
        let catalog = setup_catalog();
        assert!(Resolver::default().resolve(&catalog, "qwxz").is_none());
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = Catalog::from_records(Vec::new());
        assert!(Resolver::default().resolve(&catalog, "doliprane").is_none());
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let catalog = setup_catalog();
        let resolver = Resolver::default();
        let first = resolver.resolve(&catalog, "paracetamol").unwrap();
        for _ in 0..5 {
            let again = resolver.resolve(&catalog, "paracetamol").unwrap();
            assert_eq!(again.index, first.index);
            assert_eq!(again.strategy, first.strategy);
        }
    }

    #[test]
    fn test_score_at_threshold_is_accepted() {
        let catalog = scored_catalog();
        let found = fixed_resolver(vec![("BETA", 75.0)])
            .resolve(&catalog, "zzz")
            .unwrap();

        assert_eq!(found.record.brand_name(), "BETA");
        assert_eq!(found.strategy, MatchStrategy::BrandFuzzy);
        assert_eq!(found.score, Some(75.0));
    }

    #[test]
    fn test_score_below_threshold_falls_through() {
        let catalog = scored_catalog();

        let found = fixed_resolver(vec![("BETA", 74.99), ("Zinc", 80.0)])
            .resolve(&catalog, "zzz")
            .unwrap();
        assert_eq!(found.record.brand_name(), "ALPHA");
        assert_eq!(found.strategy, MatchStrategy::IngredientFuzzy);

        // Nothing clears the threshold: containment takes over
        let found = fixed_resolver(vec![("BETA", 74.99), ("Zinc", 74.99)])
            .resolve(&catalog, "ph")
            .unwrap();
        assert_eq!(found.record.brand_name(), "ALPHA");
        assert_eq!(found.strategy, MatchStrategy::BrandContains);
        assert_eq!(found.score, None);

        assert!(fixed_resolver(vec![("BETA", 74.99)])
            .resolve(&catalog, "zzz")
            .is_none());
    }

    #[test]
    fn test_brand_fuzzy_wins_over_ingredient_fuzzy() {
        let catalog = scored_catalog();
        let found = fixed_resolver(vec![("BETA", 90.0), ("Zinc", 95.0)])
            .resolve(&catalog, "zzz")
            .unwrap();

        assert_eq!(found.record.brand_name(), "BETA");
        assert_eq!(found.strategy, MatchStrategy::BrandFuzzy);
    }

    #[test]
    fn test_containment_returns_first_hit() {
        let catalog = Catalog::from_records(vec![
            RawRecord::new("VOLTARENE GEL", "Diclofénac"),
            RawRecord::new("FLECTOR GEL", "Diclofénac"),
        ]);
        let found = Resolver::new(Box::new(DisabledMatcher), 75.0)
            .resolve(&catalog, "gel")
            .unwrap();

        assert_eq!(found.index, 0);
        assert_eq!(found.record.brand_name(), "VOLTARENE GEL");
        assert_eq!(found.strategy, MatchStrategy::BrandContains);
    }
}
