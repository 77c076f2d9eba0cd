//! Similarity tiers.

use serde::{Deserialize, Serialize};

use super::MedicationRecord;

/// Similarity bucket, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    /// Same ingredients, form and strength
    A,
    /// Same ingredients and form
    B,
    /// Same ingredients
    C,
    /// Same ATC code
    D,
}

impl Tier {
    /// All tiers in decreasing similarity.
    pub const ALL: [Tier; 4] = [Tier::A, Tier::B, Tier::C, Tier::D];

    /// Single-letter code.
    pub fn letter(self) -> &'static str {
        match self {
            Tier::A => "A",
            Tier::B => "B",
            Tier::C => "C",
            Tier::D => "D",
        }
    }

    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            Tier::A => "Substitutable",
            Tier::B => "Equivalent",
            Tier::C => "Same composition",
            Tier::D => "Therapeutic proximity",
        }
    }

    fn index(self) -> usize {
        match self {
            Tier::A => 0,
            Tier::B => 1,
            Tier::C => 2,
            Tier::D => 3,
        }
    }
}

/// Records grouped by tier, each list in ranked order.
#[derive(Debug, Clone, Default)]
pub struct TierResults<'c> {
    buckets: [Vec<&'c MedicationRecord>; 4],
    total_sizes: [usize; 4],
}

impl<'c> TierResults<'c> {
    /// Create empty results.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to a tier.
    pub fn push(&mut self, tier: Tier, record: &'c MedicationRecord) {
        self.buckets[tier.index()].push(record);
        self.total_sizes[tier.index()] += 1;
    }

    /// Records of one tier.
    pub fn get(&self, tier: Tier) -> &[&'c MedicationRecord] {
        &self.buckets[tier.index()]
    }

    pub(crate) fn get_mut(&mut self, tier: Tier) -> &mut Vec<&'c MedicationRecord> {
        &mut self.buckets[tier.index()]
    }

    /// Number of records currently held in a tier.
    pub fn len(&self, tier: Tier) -> usize {
        self.buckets[tier.index()].len()
    }

    /// Sizes of tiers A-D as held.
    pub fn sizes(&self) -> [usize; 4] {
        Tier::ALL.map(|tier| self.len(tier))
    }

    /// Sizes of tiers A-D before any truncation.
    pub fn total_sizes(&self) -> [usize; 4] {
        self.total_sizes
    }

    /// Number of classified records (before truncation).
    pub fn total(&self) -> usize {
        self.total_sizes.iter().sum()
    }

    /// Check if no record was classified.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Keep at most `limit` records per tier. Totals are preserved.
    pub fn truncate(&mut self, limit: usize) {
        for bucket in &mut self.buckets {
            bucket.truncate(limit);
        }
    }

    /// Tier holding this exact record, if any.
    pub fn tier_of(&self, record: &MedicationRecord) -> Option<Tier> {
        Tier::ALL.into_iter().find(|tier| {
            self.get(*tier)
                .iter()
                .any(|member| std::ptr::eq(*member, record))
        })
    }

    /// Iterate over tiers in decreasing similarity.
    pub fn iter(&self) -> impl Iterator<Item = (Tier, &[&'c MedicationRecord])> + '_ {
        Tier::ALL.into_iter().map(move |tier| (tier, self.get(tier)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawRecord;

    #[test]
    fn test_tier_labels() {
        assert_eq!(Tier::A.letter(), "A");
        assert_eq!(Tier::D.label(), "Therapeutic proximity");
        assert!(Tier::A < Tier::D);
    }

    #[test]
    fn test_push_and_sizes() {
        let first = MedicationRecord::new(RawRecord::new("ONE", "x"));
        let second = MedicationRecord::new(RawRecord::new("TWO", "x"));

        let mut results = TierResults::new();
        assert!(results.is_empty());

        results.push(Tier::B, &first);
        results.push(Tier::D, &second);

        assert_eq!(results.sizes(), [0, 1, 0, 1]);
        assert_eq!(results.total(), 2);
        assert_eq!(results.tier_of(&first), Some(Tier::B));
        assert_eq!(results.tier_of(&second), Some(Tier::D));
    }

    #[test]
    fn test_tier_of_uses_identity_not_equality() {
        let record = MedicationRecord::new(RawRecord::new("ONE", "x"));
        let twin = record.clone();

        let mut results = TierResults::new();
        results.push(Tier::A, &record);

        assert_eq!(results.tier_of(&twin), None);
    }

    #[test]
    fn test_truncate_keeps_totals() {
        let records: Vec<MedicationRecord> = (0..5)
            .map(|i| MedicationRecord::new(RawRecord::new(format!("R{}", i), "x")))
            .collect();

        let mut results = TierResults::new();
        for record in &records {
            results.push(Tier::C, record);
        }
        results.truncate(2);

        assert_eq!(results.len(Tier::C), 2);
        assert_eq!(results.total_sizes(), [0, 0, 5, 0]);
        assert_eq!(results.get(Tier::C)[0].brand_name(), "R0");
    }
}
