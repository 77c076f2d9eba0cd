//! Reference resolution models.

use serde::{Deserialize, Serialize};

use super::MedicationRecord;

/// Strategy that produced a reference match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStrategy {
    /// Brand name starts with the query
    BrandPrefix,
    /// Approximate match on the brand name
    BrandFuzzy,
    /// Approximate match on the ingredient text
    IngredientFuzzy,
    /// Brand name contains the query
    BrandContains,
}

impl MatchStrategy {
    /// Check if the match came from the approximate scorer.
    pub fn is_fuzzy(self) -> bool {
        matches!(self, MatchStrategy::BrandFuzzy | MatchStrategy::IngredientFuzzy)
    }
}

/// The catalog record chosen as similarity anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution<'c> {
    /// The reference record
    pub record: &'c MedicationRecord,
    /// Position in the catalog
    pub index: usize,
    /// How the record was found
    pub strategy: MatchStrategy,
    /// Scorer result (0.0 - 100.0) for fuzzy strategies
    pub score: Option<f64>,
}
