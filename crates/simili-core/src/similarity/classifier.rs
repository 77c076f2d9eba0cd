//! Tier classification of catalog records against a reference.
//!
//! Rules, first match wins:
//! - A: same ingredients, same form, same strengths
//! - B: same ingredients, same form
//! - C: same ingredients
//! - D: same ATC code

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Catalog;
use crate::models::{MedicationRecord, Tier, TierResults};

use super::ranker;

/// How ingredient sets are compared for tiers B and C.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngredientMatch {
    /// Sets must be equal
    #[default]
    Exact,
    /// One set may contain the other
    Overlapping,
}

/// Same non-empty ingredient set on both sides.
pub fn same_composition(reference: &MedicationRecord, candidate: &MedicationRecord) -> bool {
    let ours = reference.active_ingredients_key();
    !ours.is_empty() && ours == candidate.active_ingredients_key()
}

/// Non-empty ingredient sets where one contains the other.
pub fn overlapping_composition(reference: &MedicationRecord, candidate: &MedicationRecord) -> bool {
    let ours = reference.active_ingredients_key();
    let theirs = candidate.active_ingredients_key();
    !ours.is_empty() && !theirs.is_empty() && (ours.is_subset(theirs) || ours.is_superset(theirs))
}

/// Same dosage-form key, the reference's being known.
pub fn same_form(reference: &MedicationRecord, candidate: &MedicationRecord) -> bool {
    let ours = reference.dosage_form_key();
    !ours.is_empty() && ours == candidate.dosage_form_key()
}

/// Same non-empty strength set on both sides.
pub fn same_strength(reference: &MedicationRecord, candidate: &MedicationRecord) -> bool {
    let theirs = candidate.strengths_key();
    !theirs.is_empty() && theirs == reference.strengths_key()
}

/// Same ATC code, the reference's being known.
pub fn same_atc(reference: &MedicationRecord, candidate: &MedicationRecord) -> bool {
    let ours = reference.atc_code_trimmed();
    !ours.is_empty() && candidate.atc_code_trimmed() == ours
}

/// Assigns catalog records to similarity tiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    ingredient_match: IngredientMatch,
}

impl Classifier {
    /// Create a classifier.
    pub fn new(ingredient_match: IngredientMatch) -> Self {
        Self { ingredient_match }
    }

    pub fn ingredient_match(&self) -> IngredientMatch {
        self.ingredient_match
    }

    fn related_composition(
        &self,
        reference: &MedicationRecord,
        candidate: &MedicationRecord,
    ) -> bool {
        match self.ingredient_match {
            IngredientMatch::Exact => same_composition(reference, candidate),
            IngredientMatch::Overlapping => overlapping_composition(reference, candidate),
        }
    }

    /// Tier of one candidate relative to the reference.
    ///
    /// Identity is not checked here; see [`Classifier::classify`].
    pub fn tier_for(
        &self,
        reference: &MedicationRecord,
        candidate: &MedicationRecord,
    ) -> Option<Tier> {
        let exact = same_composition(reference, candidate);
        let related = exact || self.related_composition(reference, candidate);
        let form = same_form(reference, candidate);

        if exact && form && same_strength(reference, candidate) {
            return Some(Tier::A);
        }
        if related && form {
            return Some(Tier::B);
        }
        if related {
            return Some(Tier::C);
        }
        if same_atc(reference, candidate) {
            return Some(Tier::D);
        }
        None
    }

    /// Classify every catalog record other than the reference, then rank each tier.
    pub fn classify<'c>(
        &self,
        catalog: &'c Catalog,
        reference: &MedicationRecord,
    ) -> TierResults<'c> {
        let mut results = TierResults::new();

        for record in catalog {
            if record.same_identity(reference) {
                continue;
            }
            if let Some(tier) = self.tier_for(reference, record) {
                results.push(tier, record);
            }
        }

        ranker::rank_all(&mut results);
        debug!(
            reference = reference.brand_name(),
            sizes = ?results.sizes(),
            "Classified catalog"
        );
        results
    }
}
