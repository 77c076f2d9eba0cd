//! Export of similarity results.

use serde::{Deserialize, Serialize};

use crate::models::{RawRecord, Tier};
use crate::similarity::SimilarityReport;

use super::{ExportError, ExportResult};

/// One exported record with its tier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierExportRow {
    /// Tier letter (A-D)
    pub similarity_tier: String,
    /// Source columns of the record
    #[serde(flatten)]
    pub record: RawRecord,
}

/// Similarity results ready for export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierExport {
    /// Export timestamp
    pub exported_at: String,
    /// Brand name of the reference record
    pub reference: String,
    /// Classified records, tier A first
    pub rows: Vec<TierExportRow>,
}

impl TierExport {
    /// Collect the rows of a report, tiers in decreasing similarity.
    pub fn from_report(report: &SimilarityReport<'_>) -> Self {
        let rows = report
            .tiers
            .iter()
            .flat_map(|(tier, records)| {
                records.iter().map(move |record| TierExportRow {
                    similarity_tier: tier.letter().to_string(),
                    record: record.raw().clone(),
                })
            })
            .collect();

        Self {
            exported_at: chrono::Utc::now().to_rfc3339(),
            reference: report.reference.record.brand_name().to_string(),
            rows,
        }
    }

    /// Rows of one tier.
    pub fn rows_for(&self, tier: Tier) -> impl Iterator<Item = &TierExportRow> {
        self.rows
            .iter()
            .filter(move |row| row.similarity_tier == tier.letter())
    }

    /// Export to JSON.
    pub fn to_json(&self) -> ExportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Export to CSV format, one line per record.
    pub fn to_csv(&self) -> ExportResult<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        let mut header = vec!["similarity_tier"];
        header.extend(crate::catalog::Column::ALL.iter().map(|column| column.header()));
        writer.write_record(&header)?;

        for row in &self.rows {
            let mut line = vec![row.similarity_tier.as_str()];
            line.extend(row.record.fields());
            writer.write_record(&line)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ExportError::Csv(e.into_error().into()))?;
        Ok(String::from_utf8(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::similarity::SimilarityEngine;

    fn setup_catalog() -> Catalog {
        let mut reference = RawRecord::new("DOLIPRANE 500 MG", "Paracétamol");
        reference.dosage_form = "Comprimé".into();
        reference.strengths = "500 mg".into();
        reference.atc_code = "N02BE01".into();

        let mut generic = reference.clone();
        generic.brand_name = "PARACETAMOL, GENERIQUE".into();

        let mut syrup = reference.clone();
        syrup.brand_name = "DOLIPRANE SIROP".into();
        syrup.dosage_form = "Sirop".into();

        let mut aspirin = RawRecord::new("ASPEGIC", "Acide acétylsalicylique");
        aspirin.atc_code = "N02BE01".into();

        Catalog::from_records(vec![reference, syrup, aspirin, generic])
    }

    #[test]
    fn test_rows_in_tier_order() {
        let catalog = setup_catalog();
        let report = SimilarityEngine::default().search(&catalog, "doliprane 500").unwrap();
        let export = TierExport::from_report(&report);

        assert_eq!(export.reference, "DOLIPRANE 500 MG");
        let tiers: Vec<&str> = export.rows.iter().map(|r| r.similarity_tier.as_str()).collect();
        assert_eq!(tiers, vec!["A", "C", "D"]);
        assert_eq!(export.rows_for(Tier::D).count(), 1);
    }

    #[test]
    fn test_to_csv() {
        let catalog = setup_catalog();
        let report = SimilarityEngine::default().search(&catalog, "doliprane 500").unwrap();
        let csv = TierExport::from_report(&report).to_csv().unwrap();

        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("similarity_tier,specialite,molecules"));
        assert!(header.ends_with("detail_url,labo"));

        // Commas inside fields are quoted
        let first = lines.next().unwrap();
        assert!(first.starts_with("A,\"PARACETAMOL, GENERIQUE\",Paracétamol"));
        assert_eq!(csv.lines().count(), 4);
    }

    #[test]
    fn test_to_json() {
        let catalog = setup_catalog();
        let report = SimilarityEngine::default().search(&catalog, "doliprane 500").unwrap();
        let json = TierExport::from_report(&report).to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["reference"], "DOLIPRANE 500 MG");
        assert_eq!(value["rows"][0]["similarity_tier"], "A");
        assert_eq!(value["rows"][0]["brand_name"], "PARACETAMOL, GENERIQUE");
    }
}
