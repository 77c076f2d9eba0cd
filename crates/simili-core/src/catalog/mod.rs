//! In-memory medication catalog.
//!
//! A [`Catalog`] is built once from a tabular source and never patched:
//! reloading produces a new catalog, published through [`CatalogStore`].

mod columns;
mod store;

pub use columns::*;
pub use store::*;

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use csv::ReaderBuilder;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{MedicationRecord, RawRecord};

/// Catalog errors.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog source not found or unreadable: {path}")]
    MissingSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog lock poisoned")]
    LockPoisoned,
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Non-fatal problems found while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogWarning {
    /// Expected columns absent from the source; their cells are empty.
    MissingColumns(Vec<String>),
}

impl fmt::Display for CatalogWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogWarning::MissingColumns(columns) => {
                write!(f, "Missing columns (left empty): {}", columns.join(", "))
            }
        }
    }
}

/// Restricts a catalog to some dosage forms and statuses.
///
/// An empty list means "no restriction" for that field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    /// Accepted dosage-form keys (e.g., "COMPRIME")
    pub forms: Vec<String>,
    /// Accepted raw status values
    pub statuses: Vec<String>,
}

impl CatalogFilter {
    /// Check if the filter restricts nothing.
    pub fn is_empty(&self) -> bool {
        self.forms.is_empty() && self.statuses.is_empty()
    }

    /// Check if a record passes the filter.
    pub fn accepts(&self, record: &MedicationRecord) -> bool {
        let form_ok = self.forms.is_empty()
            || self.forms.iter().any(|f| f == record.dosage_form_key());
        let status_ok =
            self.statuses.is_empty() || self.statuses.iter().any(|s| s == record.status());
        form_ok && status_ok
    }
}

/// Immutable snapshot of the medication catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    records: Vec<MedicationRecord>,
    warnings: Vec<CatalogWarning>,
    fingerprint: String,
    source: Option<PathBuf>,
    loaded_at: DateTime<Utc>,
}

impl Catalog {
    /// Load a catalog from a CSV file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> CatalogResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| CatalogError::MissingSource {
            path: path.to_path_buf(),
            source,
        })?;
        let mut catalog = Self::from_bytes(&bytes)?;
        catalog.source = Some(path.to_path_buf());
        info!(
            path = %path.display(),
            records = catalog.len(),
            fingerprint = %catalog.fingerprint,
            "Loaded catalog"
        );
        Ok(catalog)
    }

    /// Load a catalog from any CSV reader.
    pub fn from_reader<R: Read>(mut reader: R) -> CatalogResult<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    /// Build a catalog from CSV bytes.
    ///
    /// Every cell is text. Absent columns are filled with empty strings and
    /// reported as a [`CatalogWarning`].
    pub fn from_bytes(bytes: &[u8]) -> CatalogResult<Self> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_reader(bytes);

        let headers = reader.headers()?.clone();
        let positions = locate_columns(headers.iter());

        let missing: Vec<String> = Column::ALL
            .iter()
            .zip(positions.iter())
            .filter(|(_, position)| position.is_none())
            .map(|(column, _)| column.header().to_string())
            .collect();

        let mut warnings = Vec::new();
        if !missing.is_empty() {
            warn!(columns = %missing.join(", "), "Catalog source is missing columns");
            warnings.push(CatalogWarning::MissingColumns(missing));
        }

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let mut raw = RawRecord::default();
            for (column, position) in Column::ALL.into_iter().zip(positions) {
                if let Some(value) = position.and_then(|i| row.get(i)) {
                    column.assign(&mut raw, value.to_string());
                }
            }
            records.push(MedicationRecord::new(raw));
        }

        Ok(Self {
            records,
            warnings,
            fingerprint: hex::encode(Sha256::digest(bytes)),
            source: None,
            loaded_at: Utc::now(),
        })
    }

    /// Build a catalog from in-memory rows.
    pub fn from_records(rows: Vec<RawRecord>) -> Self {
        let mut hasher = Sha256::new();
        for row in &rows {
            for field in row.fields() {
                hasher.update(field.as_bytes());
                hasher.update([0x1f]);
            }
            hasher.update([0x1e]);
        }

        Self {
            records: rows.into_iter().map(MedicationRecord::new).collect(),
            warnings: Vec::new(),
            fingerprint: hex::encode(hasher.finalize()),
            source: None,
            loaded_at: Utc::now(),
        }
    }

    /// All records, in source order.
    pub fn records(&self) -> &[MedicationRecord] {
        &self.records
    }

    /// Record at a position.
    pub fn get(&self, index: usize) -> Option<&MedicationRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MedicationRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Non-fatal load warnings.
    pub fn warnings(&self) -> &[CatalogWarning] {
        &self.warnings
    }

    /// SHA-256 of the source content (hex).
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// File the catalog was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// New catalog holding only the records accepted by `filter`.
    ///
    /// The result keeps the source, fingerprint and warnings of this catalog.
    pub fn filtered(&self, filter: &CatalogFilter) -> Catalog {
        let records: Vec<MedicationRecord> = self
            .records
            .iter()
            .filter(|record| filter.accepts(record))
            .cloned()
            .collect();
        debug!(
            before = self.records.len(),
            after = records.len(),
            "Filtered catalog"
        );

        Catalog {
            records,
            warnings: self.warnings.clone(),
            fingerprint: self.fingerprint.clone(),
            source: self.source.clone(),
            loaded_at: self.loaded_at,
        }
    }

    /// Sorted, distinct, non-empty dosage-form keys.
    pub fn distinct_forms(&self) -> Vec<String> {
        distinct(self.records.iter().map(MedicationRecord::dosage_form_key))
    }

    /// Sorted, distinct, non-empty status values.
    pub fn distinct_statuses(&self) -> Vec<String> {
        distinct(self.records.iter().map(MedicationRecord::status))
    }

    /// Brand names with the most catalog rows, for an empty search box.
    ///
    /// Ordered by row count descending, then brand name ascending.
    pub fn suggestions(&self, limit: usize) -> Vec<String> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for record in &self.records {
            *counts.entry(record.brand_name()).or_insert(0) += 1;
        }

        let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        ranked
            .into_iter()
            .take(limit)
            .map(|(brand, _)| brand.to_string())
            .collect()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a MedicationRecord;
    type IntoIter = std::slice::Iter<'a, MedicationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .filter(|value| !value.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
