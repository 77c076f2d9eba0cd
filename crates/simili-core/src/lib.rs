//! Simili Core Library
//!
//! Finds medications similar to a reference product in a tabular catalog.
//!
//! # Architecture
//!
//! ```text
//!   CSV catalog ──► Catalog (normalized keys) ──► CatalogStore (Arc snapshot)
//!                                                        │
//!   free-text query ──► Resolver ────────────────────────┤
//!     brand prefix → fuzzy brand → fuzzy ingredients      │
//!     → brand containment                                 ▼
//!                                          Classifier (tiers A/B/C/D)
//!                                                        │
//!                                                     Ranker
//!                                                        │
//!                                  ┌─────────────────────┴──────────┐
//!                                  ▼                                ▼
//!                            Record cards                   CSV / JSON export
//! ```
//!
//! # Tiers
//!
//! - **A**: same ingredients, same form, same strengths
//! - **B**: same ingredients, same form, different strengths
//! - **C**: same ingredients, different form
//! - **D**: different ingredients, same ATC code
//!
//! # Modules
//!
//! - [`catalog`]: CSV loading and snapshot publication
//! - [`config`]: Tunables (fuzzy threshold, tier caps, matcher)
//! - [`models`]: Domain types (MedicationRecord, Tier, Resolution)
//! - [`resolver`]: Normalizer, approximate matchers and the reference resolver
//! - [`similarity`]: Tier classifier, ranker and search engine
//! - [`export`]: Record cards and tier exports

pub mod catalog;
pub mod config;
pub mod export;
pub mod models;
pub mod resolver;
pub mod similarity;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogFilter, CatalogStore, CatalogWarning};
pub use config::SimilarityConfig;
pub use export::{RecordCard, TierExport};
pub use models::{MatchStrategy, MedicationRecord, RawRecord, Resolution, Tier, TierResults};
pub use resolver::{normalize_form, normalized_set, Resolver};
pub use similarity::{Classifier, IngredientMatch, SimilarityEngine, SimilarityReport};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::Arc;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum SimiliError {
    #[error("Missing source: {0}")]
    MissingSource(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<catalog::CatalogError> for SimiliError {
    fn from(e: catalog::CatalogError) -> Self {
        match e {
            catalog::CatalogError::MissingSource { .. } => {
                SimiliError::MissingSource(e.to_string())
            }
            catalog::CatalogError::Csv(_) => SimiliError::InvalidInput(e.to_string()),
            _ => SimiliError::InternalError(e.to_string()),
        }
    }
}

impl From<config::ConfigError> for SimiliError {
    fn from(e: config::ConfigError) -> Self {
        SimiliError::InvalidInput(e.to_string())
    }
}

impl From<export::ExportError> for SimiliError {
    fn from(e: export::ExportError) -> Self {
        SimiliError::SerializationError(e.to_string())
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Load a catalog file with the default configuration.
#[uniffi::export]
pub fn open_catalog(path: String) -> Result<Arc<SimiliCore>, SimiliError> {
    let store = CatalogStore::new();
    store.load(&path)?;
    Ok(Arc::new(SimiliCore {
        store,
        engine: SimilarityEngine::default(),
    }))
}

/// Load a catalog file with a JSON configuration.
#[uniffi::export]
pub fn open_catalog_with_config(
    path: String,
    config_json: String,
) -> Result<Arc<SimiliCore>, SimiliError> {
    let config = SimilarityConfig::from_json_str(&config_json)?;
    let store = CatalogStore::new();
    store.load(&path)?;
    Ok(Arc::new(SimiliCore {
        store,
        engine: SimilarityEngine::new(config),
    }))
}

/// Create a core with no catalog loaded (for testing).
#[uniffi::export]
pub fn empty_core() -> Arc<SimiliCore> {
    Arc::new(SimiliCore {
        store: CatalogStore::new(),
        engine: SimilarityEngine::default(),
    })
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe catalog and search engine for FFI.
#[derive(uniffi::Object)]
pub struct SimiliCore {
    store: CatalogStore,
    engine: SimilarityEngine,
}

impl SimiliCore {
    fn catalog(&self) -> Result<Arc<Catalog>, SimiliError> {
        self.store
            .snapshot()?
            .ok_or_else(|| SimiliError::MissingSource("No catalog loaded".to_string()))
    }

    /// Current catalog, restricted by the given filters.
    fn filtered_catalog(
        &self,
        forms: Vec<String>,
        statuses: Vec<String>,
    ) -> Result<Arc<Catalog>, SimiliError> {
        let catalog = self.catalog()?;
        let filter = CatalogFilter { forms, statuses };
        if filter.is_empty() {
            Ok(catalog)
        } else {
            Ok(Arc::new(catalog.filtered(&filter)))
        }
    }
}

#[uniffi::export]
impl SimiliCore {
    // =========================================================================
    // Catalog Operations
    // =========================================================================

    /// Load (or reload) a catalog file. Returns the record count.
    ///
    /// On failure the previous catalog stays in place.
    pub fn reload(&self, path: String) -> Result<u32, SimiliError> {
        let catalog = self.store.load(&path)?;
        Ok(catalog.len() as u32)
    }

    /// Number of records in the current catalog.
    pub fn record_count(&self) -> Result<u32, SimiliError> {
        Ok(self.catalog()?.len() as u32)
    }

    /// Load warnings of the current catalog.
    pub fn warnings(&self) -> Result<Vec<String>, SimiliError> {
        Ok(self
            .catalog()?
            .warnings()
            .iter()
            .map(|w| w.to_string())
            .collect())
    }

    /// Dosage-form keys available as filters.
    pub fn distinct_forms(&self) -> Result<Vec<String>, SimiliError> {
        Ok(self.catalog()?.distinct_forms())
    }

    /// Status values available as filters.
    pub fn distinct_statuses(&self) -> Result<Vec<String>, SimiliError> {
        Ok(self.catalog()?.distinct_statuses())
    }

    /// Brands to suggest before the user types anything.
    pub fn suggestions(&self) -> Result<Vec<String>, SimiliError> {
        let catalog = self.catalog()?;
        Ok(self.engine.suggestions(&catalog))
    }

    // =========================================================================
    // Search Operations
    // =========================================================================

    /// Resolve a query and list similar products by tier.
    ///
    /// Returns `None` when the query is empty or no reference is found.
    pub fn search(
        &self,
        query: String,
        forms: Vec<String>,
        statuses: Vec<String>,
    ) -> Result<Option<FfiSimilarityReport>, SimiliError> {
        let catalog = self.filtered_catalog(forms, statuses)?;
        Ok(self
            .engine
            .search(&catalog, &query)
            .map(|report| FfiSimilarityReport::from(&report)))
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Export search results as CSV.
    pub fn export_csv(
        &self,
        query: String,
        forms: Vec<String>,
        statuses: Vec<String>,
    ) -> Result<Option<String>, SimiliError> {
        let catalog = self.filtered_catalog(forms, statuses)?;
        match self.engine.search(&catalog, &query) {
            Some(report) => Ok(Some(TierExport::from_report(&report).to_csv()?)),
            None => Ok(None),
        }
    }

    /// Export search results as JSON.
    pub fn export_json(
        &self,
        query: String,
        forms: Vec<String>,
        statuses: Vec<String>,
    ) -> Result<Option<String>, SimiliError> {
        let catalog = self.filtered_catalog(forms, statuses)?;
        match self.engine.search(&catalog, &query) {
            Some(report) => Ok(Some(TierExport::from_report(&report).to_json()?)),
            None => Ok(None),
        }
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe medication record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicationRecord {
    pub brand_name: String,
    pub active_ingredients: String,
    pub strengths: String,
    pub dosage_form: String,
    pub status: String,
    pub atc_code: String,
    pub manufacturer: String,
    pub detail_reference: String,
    pub marketed: bool,
    /// Detail card rendered as Markdown
    pub card_markdown: String,
}

impl From<&MedicationRecord> for FfiMedicationRecord {
    fn from(record: &MedicationRecord) -> Self {
        let raw = record.raw();
        Self {
            brand_name: raw.brand_name.clone(),
            active_ingredients: raw.active_ingredients.clone(),
            strengths: raw.strengths.clone(),
            dosage_form: raw.dosage_form.clone(),
            status: raw.status.clone(),
            atc_code: raw.atc_code.clone(),
            manufacturer: raw.manufacturer.clone(),
            detail_reference: raw.detail_reference.clone(),
            marketed: record.is_marketed(),
            card_markdown: RecordCard::from_record(record).to_markdown(),
        }
    }
}

/// FFI-safe similarity report.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSimilarityReport {
    pub reference: FfiMedicationRecord,
    /// Strategy that found the reference (e.g., "BrandPrefix")
    pub strategy: String,
    /// Fuzzy score, for fuzzy strategies only
    pub score: Option<f64>,
    pub tier_a: Vec<FfiMedicationRecord>,
    pub tier_b: Vec<FfiMedicationRecord>,
    pub tier_c: Vec<FfiMedicationRecord>,
    pub tier_d: Vec<FfiMedicationRecord>,
    /// Tier sizes before the display cap, A to D
    pub tier_sizes: Vec<u32>,
}

impl From<&SimilarityReport<'_>> for FfiSimilarityReport {
    fn from(report: &SimilarityReport<'_>) -> Self {
        let convert = |tier: Tier| -> Vec<FfiMedicationRecord> {
            report
                .tiers
                .get(tier)
                .iter()
                .map(|record| FfiMedicationRecord::from(*record))
                .collect()
        };

        Self {
            reference: report.reference.record.into(),
            strategy: format!("{:?}", report.reference.strategy),
            score: report.reference.score,
            tier_a: convert(Tier::A),
            tier_b: convert(Tier::B),
            tier_c: convert(Tier::C),
            tier_d: convert(Tier::D),
            tier_sizes: report.tiers.total_sizes().iter().map(|&n| n as u32).collect(),
        }
    }
}
