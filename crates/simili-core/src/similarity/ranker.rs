//! Ordering of records within a tier.

use std::cmp::Ordering;

use crate::models::{MedicationRecord, Tier, TierResults};

/// Marketed records first, then brand name ascending.
pub fn compare(a: &MedicationRecord, b: &MedicationRecord) -> Ordering {
    b.is_marketed()
        .cmp(&a.is_marketed())
        .then_with(|| a.brand_name().cmp(b.brand_name()))
}

/// Sort a tier in place. Equal records keep their catalog order.
pub fn rank(records: &mut [&MedicationRecord]) {
    records.sort_by(|a, b| compare(a, b));
}

/// Sort every tier.
pub fn rank_all(results: &mut TierResults<'_>) {
    for tier in Tier::ALL {
        rank(results.get_mut(tier));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawRecord;

    fn record(brand: &str, status: &str, detail: &str) -> MedicationRecord {
        let mut raw = RawRecord::new(brand, "x");
        raw.status = status.into();
        raw.detail_reference = detail.into();
        MedicationRecord::new(raw)
    }

    #[test]
    fn test_marketed_first() {
        let stopped = record("AAA", "Arrêté", "1");
        let marketed = record("ZZZ", "Commercialisé", "2");

        let mut tier = vec![&stopped, &marketed];
        rank(&mut tier);

        assert_eq!(tier[0].brand_name(), "ZZZ");
        assert_eq!(tier[1].brand_name(), "AAA");
    }

    #[test]
    fn test_alphabetical_within_status() {
        let b = record("BETA", "Commercialisé", "1");
        let a = record("ALPHA", "Commercialisé", "2");
        let c = record("CHI", "", "3");

        let mut tier = vec![&c, &b, &a];
        rank(&mut tier);

        let names: Vec<&str> = tier.iter().map(|r| r.brand_name()).collect();
        assert_eq!(names, vec!["ALPHA", "BETA", "CHI"]);
    }

    #[test]
    fn test_stable_for_equal_keys() {
        let first = record("SAME", "Commercialisé", "first");
        let second = record("SAME", "commercialisé", "second");

        let mut tier = vec![&first, &second];
        rank(&mut tier);
        assert_eq!(tier[0].detail_reference(), "first");

        let mut tier = vec![&second, &first];
        rank(&mut tier);
        assert_eq!(tier[0].detail_reference(), "second");
    }
}
