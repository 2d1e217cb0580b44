//! Snapshot persistence service
//!
//! Loads an inventory from a JSON array of products and saves the ordered
//! snapshot back. The tree itself knows nothing about this format.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::application::services::InventoryService;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{Product, ProductId};
use crate::infrastructure::traits::FileSystem;

/// What to do when snapshot data contains an id that is already present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Keep the first record, log and skip the later one
    #[default]
    Skip,
    /// Stop loading and report the duplicate
    Abort,
}

/// Result of loading a snapshot file.
#[derive(Debug)]
pub struct LoadReport {
    /// The loaded inventory (clean)
    pub inventory: InventoryService,
    /// Number of records inserted
    pub loaded: usize,
    /// Ids skipped because they were already present
    pub skipped: Vec<ProductId>,
}

/// Result of merging a snapshot file into an existing inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: Vec<ProductId>,
}

/// Service for reading and writing inventory snapshots.
pub struct SnapshotService {
    fs: Arc<dyn FileSystem>,
}

impl SnapshotService {
    /// Create a new snapshot service.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Load the inventory stored at `path`.
    ///
    /// A missing file yields an empty inventory. Records are inserted one by
    /// one in stored order, so the file may be in any key order.
    pub fn load(&self, path: &Path, policy: DuplicatePolicy) -> ApplicationResult<LoadReport> {
        let mut inventory = InventoryService::new();
        if !self.fs.exists(path) {
            debug!("load: no snapshot at {}, starting empty", path.display());
            return Ok(LoadReport {
                inventory,
                loaded: 0,
                skipped: Vec::new(),
            });
        }

        let records = self.read_records(path)?;
        let report = Self::insert_all(&mut inventory, records, policy)?;
        inventory.mark_clean();

        info!(
            "loaded {} products from {} ({} skipped)",
            report.imported,
            path.display(),
            report.skipped.len()
        );
        Ok(LoadReport {
            inventory,
            loaded: report.imported,
            skipped: report.skipped,
        })
    }

    /// Merge the products stored at `path` into `inventory`.
    pub fn import(
        &self,
        inventory: &mut InventoryService,
        path: &Path,
        policy: DuplicatePolicy,
    ) -> ApplicationResult<ImportReport> {
        if !self.fs.exists(path) {
            return Err(ApplicationError::Snapshot {
                path: path.to_path_buf(),
                message: "file not found".to_string(),
            });
        }
        let records = self.read_records(path)?;
        let report = Self::insert_all(inventory, records, policy)?;
        info!("imported {} products from {}", report.imported, path.display());
        Ok(report)
    }

    /// Write the ordered snapshot of `inventory` to `path`.
    ///
    /// The file is written next to the target first and then renamed over it.
    /// Returns the number of records written.
    pub fn save(&self, inventory: &InventoryService, path: &Path) -> ApplicationResult<usize> {
        let products = inventory.list();
        let json = serde_json::to_string_pretty(&products).map_err(|e| ApplicationError::Snapshot {
            path: path.to_path_buf(),
            message: format!("serialize: {e}"),
        })?;

        self.fs
            .ensure_parent(path)
            .with_path_context("create parent directory", path)?;
        let staging = staging_path(path);
        self.fs
            .write(&staging, &json)
            .with_path_context("write snapshot", &staging)?;
        if let Err(e) = self.fs.rename(&staging, path) {
            if let Err(cleanup) = self.fs.remove_file(&staging) {
                warn!("could not remove {}: {}", staging.display(), cleanup);
            }
            return Err(e).with_path_context("replace snapshot", path);
        }

        info!("saved {} products to {}", products.len(), path.display());
        Ok(products.len())
    }

    fn read_records(&self, path: &Path) -> ApplicationResult<Vec<Product>> {
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read snapshot", path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| ApplicationError::Snapshot {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn insert_all(
        inventory: &mut InventoryService,
        records: Vec<Product>,
        policy: DuplicatePolicy,
    ) -> ApplicationResult<ImportReport> {
        let mut report = ImportReport {
            imported: 0,
            skipped: Vec::new(),
        };
        for product in records {
            match inventory.add(product) {
                Ok(()) => report.imported += 1,
                Err(ApplicationError::DuplicateProduct(id)) if policy == DuplicatePolicy::Skip => {
                    warn!("skipping duplicate product id {}", id);
                    report.skipped.push(id);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(report)
    }
}

/// `inventory.json` -> `inventory.json.tmp` in the same directory.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("snapshot"));
    name.push(".tmp");
    path.with_file_name(name)
}
