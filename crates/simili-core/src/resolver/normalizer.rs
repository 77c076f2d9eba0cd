//! Catalog text normalizer.
//!
//! Handles:
//! - Accent stripping (NFD decomposition, combining marks dropped)
//! - Multi-value fields (`a / b`, `a, b`, `a | b` → `a | b`)
//! - Normalized token sets for ingredient/strength comparison
//! - Dosage-form bucketing into a fixed vocabulary
//!
//! Every function here is pure: the same raw text always yields the same key.

use std::collections::BTreeSet;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Separator used in canonical multi-value strings.
pub const VALUE_SEPARATOR: &str = " | ";

/// Maximum length (in characters) of an unrecognized dosage-form key.
pub const FORM_FALLBACK_MAX_CHARS: usize = 40;

/// Casing applied to each segment of a multi-value field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    /// Lower-cased and accent-stripped (comparison form)
    Lower,
    /// Original casing and accents (display form)
    Pretty,
}

/// Known dosage-form buckets, in matching priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DosageForm {
    Comprime,
    Gelule,
    Sirop,
    Solution,
    Poudre,
    Capsule,
    Suspension,
    Collyre,
}

impl DosageForm {
    /// All buckets. The first keyword found in a form text wins.
    pub const ALL: [DosageForm; 8] = [
        DosageForm::Comprime,
        DosageForm::Gelule,
        DosageForm::Sirop,
        DosageForm::Solution,
        DosageForm::Poudre,
        DosageForm::Capsule,
        DosageForm::Suspension,
        DosageForm::Collyre,
    ];

    /// Lower-case keyword searched for in the normalized form text.
    pub fn keyword(self) -> &'static str {
        match self {
            DosageForm::Comprime => "comprime",
            DosageForm::Gelule => "gelule",
            DosageForm::Sirop => "sirop",
            DosageForm::Solution => "solution",
            DosageForm::Poudre => "poudre",
            DosageForm::Capsule => "capsule",
            DosageForm::Suspension => "suspension",
            DosageForm::Collyre => "collyre",
        }
    }

    /// Canonical key stored on records.
    pub fn as_key(self) -> &'static str {
        match self {
            DosageForm::Comprime => "COMPRIME",
            DosageForm::Gelule => "GELULE",
            DosageForm::Sirop => "SIROP",
            DosageForm::Solution => "SOLUTION",
            DosageForm::Poudre => "POUDRE",
            DosageForm::Capsule => "CAPSULE",
            DosageForm::Suspension => "SUSPENSION",
            DosageForm::Collyre => "COLLYRE",
        }
    }

    /// Parse a canonical key back into a bucket. Fallback keys return `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|form| form.as_key() == key)
    }
}

/// Remove diacritics: `"Paracétamol"` → `"Paracetamol"`.
pub fn strip_accents(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Accent-stripped, lower-cased brand name used for prefix and containment lookups.
pub fn brand_key(brand: &str) -> String {
    strip_accents(brand).to_lowercase()
}

/// Unify the separators of a multi-value field into `"a | b | c"`.
///
/// `" / "` and `"/"` both act as `"|"`. When no pipe is present but a comma
/// is, commas become the separator. Segments are trimmed and empty ones dropped.
pub fn normalize_multi_value(text: &str, case: Case) -> String {
    if text.is_empty() {
        return String::new();
    }

    let unified = text.replace(" / ", " | ").replace('/', " | ");
    let unified = if !unified.contains('|') && unified.contains(',') {
        unified.replace(',', "|")
    } else {
        unified
    };

    unified
        .split('|')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| match case {
            Case::Lower => strip_accents(segment).to_lowercase(),
            Case::Pretty => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join(VALUE_SEPARATOR)
}

/// Comparison form of a multi-value field.
pub fn normalize_pipes_lower(text: &str) -> String {
    normalize_multi_value(text, Case::Lower)
}

/// Display form of a multi-value field.
pub fn normalize_pipes_pretty(text: &str) -> String {
    normalize_multi_value(text, Case::Pretty)
}

/// Split a `"a | b"` string into a set of normalized tokens.
///
/// Order and duplicates are irrelevant: two fields are "the same" when their
/// sets are equal.
pub fn normalized_set(text: &str) -> BTreeSet<String> {
    text.split('|')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| strip_accents(token).to_lowercase())
        .collect()
}

/// Serialize a token set back into canonical `"a | b"` form.
pub fn serialize_set(set: &BTreeSet<String>) -> String {
    set.iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(VALUE_SEPARATOR)
}

/// Bucket a free-text dosage form.
///
/// Known forms map to their canonical key (see [`DosageForm`]); anything else
/// becomes the upper-cased normalized text, truncated. Empty input stays empty.
pub fn normalize_form(text: &str) -> String {
    let lowered = strip_accents(text).to_lowercase();
    let trimmed = lowered.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let expanded = trimmed
        .replace("comp.", "comprime")
        .replace("cp", "comprime");

    if let Some(form) = DosageForm::ALL
        .into_iter()
        .find(|form| expanded.contains(form.keyword()))
    {
        return form.as_key().to_string();
    }

    expanded
        .to_uppercase()
        .chars()
        .take(FORM_FALLBACK_MAX_CHARS)
        .collect()
}
