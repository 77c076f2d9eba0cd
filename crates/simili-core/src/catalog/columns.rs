//! Recognized source columns.

use crate::models::RawRecord;

/// A column of the tabular catalog source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    BrandName,
    ActiveIngredients,
    Strengths,
    DosageForm,
    Status,
    TherapeuticClass,
    AtcCode,
    PresentationText,
    CompositionPretty,
    DosagePretty,
    PresentationPretty,
    DetailReference,
    Manufacturer,
}

impl Column {
    /// All columns, in [`RawRecord::fields`] order.
    pub const ALL: [Column; 13] = [
        Column::BrandName,
        Column::ActiveIngredients,
        Column::Strengths,
        Column::DosageForm,
        Column::Status,
        Column::TherapeuticClass,
        Column::AtcCode,
        Column::PresentationText,
        Column::CompositionPretty,
        Column::DosagePretty,
        Column::PresentationPretty,
        Column::DetailReference,
        Column::Manufacturer,
    ];

    /// Header written by the catalog parser.
    pub fn header(self) -> &'static str {
        match self {
            Column::BrandName => "specialite",
            Column::ActiveIngredients => "molecules",
            Column::Strengths => "grammages",
            Column::DosageForm => "forme",
            Column::Status => "statut",
            Column::TherapeuticClass => "classe_therapeutique",
            Column::AtcCode => "atc_code",
            Column::PresentationText => "presentation",
            Column::CompositionPretty => "composition_pretty",
            Column::DosagePretty => "dosage_pretty",
            Column::PresentationPretty => "presentation_pretty",
            Column::DetailReference => "detail_url",
            Column::Manufacturer => "labo",
        }
    }

    /// Alternate header accepted for the same column.
    pub fn alias(self) -> &'static str {
        match self {
            Column::BrandName => "brandName",
            Column::ActiveIngredients => "activeIngredients",
            Column::Strengths => "strengths",
            Column::DosageForm => "dosageForm",
            Column::Status => "status",
            Column::TherapeuticClass => "therapeuticClass",
            Column::AtcCode => "atcCode",
            Column::PresentationText => "presentationText",
            Column::CompositionPretty => "compositionPretty",
            Column::DosagePretty => "dosagePretty",
            Column::PresentationPretty => "presentationPretty",
            Column::DetailReference => "detailReference",
            Column::Manufacturer => "manufacturer",
        }
    }

    /// Check whether a (normalized) header names this column.
    pub fn matches(self, header: &str) -> bool {
        header == self.header() || header == self.alias()
    }

    /// Store a cell value in the matching record field.
    pub fn assign(self, record: &mut RawRecord, value: String) {
        let field = match self {
            Column::BrandName => &mut record.brand_name,
            Column::ActiveIngredients => &mut record.active_ingredients,
            Column::Strengths => &mut record.strengths,
            Column::DosageForm => &mut record.dosage_form,
            Column::Status => &mut record.status,
            Column::TherapeuticClass => &mut record.therapeutic_class,
            Column::AtcCode => &mut record.atc_code,
            Column::PresentationText => &mut record.presentation_text,
            Column::CompositionPretty => &mut record.composition_pretty,
            Column::DosagePretty => &mut record.dosage_pretty,
            Column::PresentationPretty => &mut record.presentation_pretty,
            Column::DetailReference => &mut record.detail_reference,
            Column::Manufacturer => &mut record.manufacturer,
        };
        *field = value;
    }
}

/// Strip whitespace and a UTF-8 byte-order mark from a header cell.
pub fn normalize_header(raw: &str) -> &str {
    raw.trim().trim_matches('\u{feff}').trim()
}

/// Position of each column in a header row, `None` when absent.
pub fn locate_columns<'h>(headers: impl IntoIterator<Item = &'h str>) -> [Option<usize>; 13] {
    let headers: Vec<&str> = headers.into_iter().map(normalize_header).collect();
    Column::ALL.map(|column| headers.iter().position(|h| column.matches(h)))
}
