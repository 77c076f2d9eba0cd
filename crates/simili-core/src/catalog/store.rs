//! Snapshot publication for catalogs.
//!
//! Queries take an `Arc<Catalog>` snapshot and keep it for their whole
//! duration; a reload swaps in a new catalog without touching the old one.

use std::path::Path;
use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use super::{Catalog, CatalogError, CatalogResult};

/// Holder of the current catalog snapshot.
#[derive(Debug, Default)]
pub struct CatalogStore {
    current: RwLock<Option<Arc<Catalog>>>,
}

impl CatalogStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding a catalog.
    pub fn with_catalog(catalog: Catalog) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(catalog))),
        }
    }

    /// Current snapshot, if a catalog was published.
    pub fn snapshot(&self) -> CatalogResult<Option<Arc<Catalog>>> {
        let guard = self.current.read().map_err(|_| CatalogError::LockPoisoned)?;
        Ok(guard.clone())
    }

    /// Replace the current catalog.
    pub fn publish(&self, catalog: Catalog) -> CatalogResult<Arc<Catalog>> {
        let catalog = Arc::new(catalog);
        let mut guard = self.current.write().map_err(|_| CatalogError::LockPoisoned)?;
        *guard = Some(Arc::clone(&catalog));
        Ok(catalog)
    }

    /// Load a catalog file and publish it.
    ///
    /// If the current snapshot came from the same path with the same content,
    /// it is kept and returned instead.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> CatalogResult<Arc<Catalog>> {
        let path = path.as_ref();
        let catalog = Catalog::from_path(path)?;

        if let Some(current) = self.snapshot()? {
            if current.source() == Some(path) && current.fingerprint() == catalog.fingerprint() {
                debug!(path = %path.display(), "Catalog unchanged, keeping snapshot");
                return Ok(current);
            }
        }

        info!(path = %path.display(), records = catalog.len(), "Publishing catalog snapshot");
        self.publish(catalog)
    }

    /// Drop the current snapshot. Outstanding snapshots stay valid.
    pub fn clear(&self) -> CatalogResult<()> {
        let mut guard = self.current.write().map_err(|_| CatalogError::LockPoisoned)?;
        *guard = None;
        Ok(())
    }
}
