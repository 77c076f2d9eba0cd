//! Medication catalog records.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::resolver::{
    brand_key, normalize_form, normalize_pipes_lower, normalize_pipes_pretty, normalized_set,
};

/// Status prefix marking a product as currently marketed ("commercialisé").
const MARKETED_PREFIX: &str = "com";

/// A catalog row exactly as read from the tabular source.
///
/// Absent columns and cells are empty strings, never missing values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RawRecord {
    /// Commercial product name
    pub brand_name: String,
    /// Active ingredients (DCI), pipe- or comma-delimited
    pub active_ingredients: String,
    /// Strengths, pipe- or comma-delimited (e.g., "500 mg")
    pub strengths: String,
    /// Pharmaceutical form as written (e.g., "Comprimé pelliculé")
    pub dosage_form: String,
    /// Marketing status (e.g., "Commercialisé", "Arrêté")
    pub status: String,
    /// Therapeutic class label
    pub therapeutic_class: String,
    /// ATC classification code (e.g., "N02BE01")
    pub atc_code: String,
    /// Presentation (packaging) text
    pub presentation_text: String,
    /// Composition for display
    pub composition_pretty: String,
    /// Dosage for display
    pub dosage_pretty: String,
    /// Presentation for display
    pub presentation_pretty: String,
    /// Link or identifier of the product detail sheet
    pub detail_reference: String,
    /// Manufacturer / distributor
    pub manufacturer: String,
}

impl RawRecord {
    /// Create a raw record with a brand name and ingredients.
    pub fn new(brand_name: impl Into<String>, active_ingredients: impl Into<String>) -> Self {
        Self {
            brand_name: brand_name.into(),
            active_ingredients: active_ingredients.into(),
            ..Self::default()
        }
    }

    /// Field values in source column order.
    pub fn fields(&self) -> [&str; 13] {
        [
            self.brand_name.as_str(),
            self.active_ingredients.as_str(),
            self.strengths.as_str(),
            self.dosage_form.as_str(),
            self.status.as_str(),
            self.therapeutic_class.as_str(),
            self.atc_code.as_str(),
            self.presentation_text.as_str(),
            self.composition_pretty.as_str(),
            self.dosage_pretty.as_str(),
            self.presentation_pretty.as_str(),
            self.detail_reference.as_str(),
            self.manufacturer.as_str(),
        ]
    }
}

/// A catalog record with its comparison keys.
///
/// Keys are derived once at construction; the record is never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MedicationRecord {
    #[serde(flatten)]
    raw: RawRecord,
    active_ingredients_key: BTreeSet<String>,
    dosage_form_key: String,
    strengths_key: BTreeSet<String>,
    #[serde(skip)]
    brand_key: String,
}

impl MedicationRecord {
    /// Derive comparison keys from a raw row.
    pub fn new(raw: RawRecord) -> Self {
        let active_ingredients_key =
            normalized_set(&normalize_pipes_lower(&raw.active_ingredients));
        let strengths_key = normalized_set(&normalize_pipes_lower(&raw.strengths));
        let dosage_form_key = normalize_form(&raw.dosage_form);
        let brand_key = brand_key(&raw.brand_name);

        Self {
            raw,
            active_ingredients_key,
            dosage_form_key,
            strengths_key,
            brand_key,
        }
    }

    /// The source row.
    pub fn raw(&self) -> &RawRecord {
        &self.raw
    }

    pub fn brand_name(&self) -> &str {
        &self.raw.brand_name
    }

    pub fn active_ingredients(&self) -> &str {
        &self.raw.active_ingredients
    }

    pub fn strengths(&self) -> &str {
        &self.raw.strengths
    }

    pub fn dosage_form(&self) -> &str {
        &self.raw.dosage_form
    }

    pub fn status(&self) -> &str {
        &self.raw.status
    }

    pub fn atc_code(&self) -> &str {
        &self.raw.atc_code
    }

    pub fn detail_reference(&self) -> &str {
        &self.raw.detail_reference
    }

    /// Normalized ingredient tokens.
    pub fn active_ingredients_key(&self) -> &BTreeSet<String> {
        &self.active_ingredients_key
    }

    /// Dosage-form bucket, or the truncated fallback text, or `""`.
    pub fn dosage_form_key(&self) -> &str {
        &self.dosage_form_key
    }

    /// Normalized strength tokens.
    pub fn strengths_key(&self) -> &BTreeSet<String> {
        &self.strengths_key
    }

    /// Accent-stripped, lower-cased brand name.
    pub fn brand_key(&self) -> &str {
        &self.brand_key
    }

    /// Identity of the record: brand name plus detail reference.
    pub fn identity_key(&self) -> (&str, &str) {
        (self.raw.brand_name.as_str(), self.raw.detail_reference.as_str())
    }

    /// Check whether two records denote the same catalog entry.
    pub fn same_identity(&self, other: &MedicationRecord) -> bool {
        self.identity_key() == other.identity_key()
    }

    /// Ingredients for display, in source order.
    pub fn ingredient_list(&self) -> Vec<String> {
        split_pretty(&self.raw.active_ingredients)
    }

    /// Strengths for display, in source order.
    pub fn strength_list(&self) -> Vec<String> {
        split_pretty(&self.raw.strengths)
    }

    /// ATC code without surrounding whitespace.
    pub fn atc_code_trimmed(&self) -> &str {
        self.raw.atc_code.trim()
    }

    /// Check whether the status marks the product as marketed.
    pub fn is_marketed(&self) -> bool {
        self.raw
            .status
            .to_lowercase()
            .starts_with(MARKETED_PREFIX)
    }
}

impl From<RawRecord> for MedicationRecord {
    fn from(raw: RawRecord) -> Self {
        Self::new(raw)
    }
}

fn split_pretty(text: &str) -> Vec<String> {
    let pretty = normalize_pipes_pretty(text);
    if pretty.is_empty() {
        return Vec::new();
    }
    pretty.split(" | ").map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(brand: &str, ingredients: &str, form: &str, strengths: &str) -> RawRecord {
        RawRecord {
            strengths: strengths.into(),
            dosage_form: form.into(),
            ..RawRecord::new(brand, ingredients)
        }
    }

    #[test]
    fn test_derived_keys() {
        let record = MedicationRecord::new(raw(
            "DOLIPRANE 500 MG",
            "Paracétamol",
            "Comprimé",
            "500 mg",
        ));

        assert_eq!(record.dosage_form_key(), "COMPRIME");
        assert!(record.active_ingredients_key().contains("paracetamol"));
        assert!(record.strengths_key().contains("500 mg"));
        assert_eq!(record.brand_key(), "doliprane 500 mg");
    }

    #[test]
    fn test_multi_ingredient_keys() {
        let record = MedicationRecord::new(RawRecord::new(
            "AUGMENTIN",
            "Amoxicilline / Acide clavulanique",
        ));
        let key = record.active_ingredients_key();
        assert_eq!(key.len(), 2);
        assert!(key.contains("amoxicilline"));
        assert!(key.contains("acide clavulanique"));
        assert_eq!(
            record.ingredient_list(),
            vec!["Amoxicilline".to_string(), "Acide clavulanique".to_string()]
        );
    }

    #[test]
    fn test_empty_fields_give_empty_keys() {
        let record = MedicationRecord::new(RawRecord::default());
        assert!(record.active_ingredients_key().is_empty());
        assert!(record.strengths_key().is_empty());
        assert_eq!(record.dosage_form_key(), "");
        assert!(record.ingredient_list().is_empty());
    }

    #[test]
    fn test_keys_are_deterministic() {
        let a = MedicationRecord::new(raw("X", "Zinc | Fer", "Gélule", "10 mg"));
        let b = MedicationRecord::new(a.raw().clone());
        assert_eq!(a, b);
    }

    #[test]
    fn test_is_marketed() {
        let mut row = RawRecord::new("X", "y");
        row.status = "Commercialisé".into();
        assert!(MedicationRecord::new(row.clone()).is_marketed());

        row.status = "COMMERCIALISE".into();
        assert!(MedicationRecord::new(row.clone()).is_marketed());

        row.status = "Arrêté".into();
        assert!(!MedicationRecord::new(row.clone()).is_marketed());

        row.status = String::new();
        assert!(!MedicationRecord::new(row).is_marketed());
    }

    #[test]
    fn test_identity_key() {
        let mut row = RawRecord::new("DOLIPRANE", "Paracétamol");
        row.detail_reference = "/fiche/1".into();
        let a = MedicationRecord::new(row.clone());

        row.strengths = "1000 mg".into();
        let b = MedicationRecord::new(row.clone());
        assert!(a.same_identity(&b));

        row.detail_reference = "/fiche/2".into();
        let c = MedicationRecord::new(row);
        assert!(!a.same_identity(&c));
    }

    #[test]
    fn test_atc_code_trimmed() {
        let mut row = RawRecord::new("X", "y");
        row.atc_code = "  N02BE01 ".into();
        assert_eq!(MedicationRecord::new(row).atc_code_trimmed(), "N02BE01");
    }
}
