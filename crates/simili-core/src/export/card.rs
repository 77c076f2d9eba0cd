//! Display card of a medication record.

use serde::{Deserialize, Serialize};

use crate::models::MedicationRecord;
use crate::resolver::normalize_pipes_pretty;

/// One labelled line of a card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardLine {
    pub label: String,
    pub value: String,
}

/// Detail lines shown for a record. Empty fields are omitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordCard {
    /// Card title (brand name)
    pub title: String,
    /// Detail lines in display order
    pub lines: Vec<CardLine>,
}

impl RecordCard {
    /// Build the card of a record.
    ///
    /// Display columns are preferred; raw columns fill in when they are empty.
    pub fn from_record(record: &MedicationRecord) -> Self {
        let raw = record.raw();

        let presentation = or_else(
            normalize_pipes_pretty(&raw.presentation_pretty),
            &raw.presentation_text,
        );
        let dosage = or_else(normalize_pipes_pretty(&raw.dosage_pretty), &raw.strengths);
        let composition = or_else(raw.composition_pretty.clone(), &raw.active_ingredients);

        let candidates = [
            ("Presentation", presentation),
            ("Dosage", dosage),
            ("Manufacturer", raw.manufacturer.clone()),
            ("Composition", composition),
            ("Therapeutic class", raw.therapeutic_class.clone()),
            ("Status", raw.status.clone()),
            ("ATC code", raw.atc_code.clone()),
            ("Detail", raw.detail_reference.clone()),
        ];

        let lines = candidates
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(label, value)| CardLine {
                label: label.to_string(),
                value,
            })
            .collect();

        Self {
            title: record.brand_name().to_string(),
            lines,
        }
    }

    /// Render as Markdown, one `**label** : value` per line.
    pub fn to_markdown(&self) -> String {
        self.lines
            .iter()
            .map(|line| format!("**{}** : {}", line.label, line.value))
            .collect::<Vec<_>>()
            .join("  \n")
    }

    /// Value of a line by label.
    pub fn value(&self, label: &str) -> Option<&str> {
        self.lines
            .iter()
            .find(|line| line.label == label)
            .map(|line| line.value.as_str())
    }
}

fn or_else(preferred: String, fallback: &str) -> String {
    if preferred.is_empty() {
        fallback.to_string()
    } else {
        preferred
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawRecord;

    #[test]
    fn test_card_prefers_pretty_columns() {
        let mut raw = RawRecord::new("DOLIPRANE 500 MG", "Paracétamol");
        raw.strengths = "500 mg".into();
        raw.dosage_pretty = "500 mg / comprimé".into();
        raw.presentation_text = "Boîte de 16".into();
        raw.composition_pretty = "Paracétamol 500 mg".into();
        raw.manufacturer = "Sanofi".into();

        let card = RecordCard::from_record(&MedicationRecord::new(raw));

        assert_eq!(card.title, "DOLIPRANE 500 MG");
        assert_eq!(card.value("Dosage"), Some("500 mg | comprimé"));
        assert_eq!(card.value("Presentation"), Some("Boîte de 16"));
        assert_eq!(card.value("Composition"), Some("Paracétamol 500 mg"));
        assert_eq!(card.value("Manufacturer"), Some("Sanofi"));
        assert_eq!(card.value("ATC code"), None);
    }

    #[test]
    fn test_card_falls_back_to_raw_columns() {
        let mut raw = RawRecord::new("X", "Zinc");
        raw.strengths = "10 mg".into();
        let card = RecordCard::from_record(&MedicationRecord::new(raw));

        assert_eq!(card.value("Dosage"), Some("10 mg"));
        assert_eq!(card.value("Composition"), Some("Zinc"));
    }

    #[test]
    fn test_markdown() {
        let mut raw = RawRecord::new("X", "Zinc");
        raw.status = "Commercialisé".into();
        let card = RecordCard::from_record(&MedicationRecord::new(raw));

        assert_eq!(
            card.to_markdown(),
            "**Composition** : Zinc  \n**Status** : Commercialisé"
        );
    }

    #[test]
    fn test_empty_record_card() {
        let card = RecordCard::from_record(&MedicationRecord::new(RawRecord::default()));
        assert!(card.lines.is_empty());
        assert_eq!(card.to_markdown(), "");
    }
}
