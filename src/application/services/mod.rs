//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem) but are themselves
//! concrete structs, not traits.

mod inventory;
mod snapshot;

pub use inventory::{InventoryService, InventoryStats};
pub use snapshot::{DuplicatePolicy, ImportReport, LoadReport, SnapshotService};
