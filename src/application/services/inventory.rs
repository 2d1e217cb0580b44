//! Inventory state service
//!
//! Owns the product tree for the lifetime of a command. There is exactly one
//! instance per run, created by the snapshot loader and handed to whichever
//! command needs it.

use tracing::{debug, info};

use crate::application::ApplicationResult;
use crate::domain::{AvlTree, Product, ProductId};

/// Summary figures over the whole inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryStats {
    /// Number of distinct products
    pub count: usize,
    /// Height of the backing tree
    pub height: usize,
    /// Product id at the root of the tree
    pub root: Option<ProductId>,
    /// Sum of all quantities
    pub total_units: u64,
    /// Sum of price × quantity, in cents
    pub total_value_cents: u128,
}

/// Service for listing, finding, adding and removing products.
#[derive(Debug, Default)]
pub struct InventoryService {
    products: AvlTree<Product>,
    dirty: bool,
}

impl InventoryService {
    /// Create an empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already populated tree; the result is considered clean.
    pub fn from_tree(products: AvlTree<Product>) -> Self {
        Self {
            products,
            dirty: false,
        }
    }

    /// All products ordered by id.
    pub fn list(&self) -> Vec<&Product> {
        self.products.list_ordered()
    }

    pub fn find(&self, id: ProductId) -> Option<&Product> {
        self.products.search(id)
    }

    /// Validate and insert a new product.
    ///
    /// Existing products are never overwritten; a taken id yields
    /// `ApplicationError::DuplicateProduct`.
    pub fn add(&mut self, product: Product) -> ApplicationResult<()> {
        product.validate()?;
        let id = product.id;
        self.products.insert(product)?;
        self.dirty = true;
        debug!("added product {}", id);
        Ok(())
    }

    /// Remove a product; returns false if no product has this id.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let removed = self.products.delete(id);
        if removed {
            self.dirty = true;
            info!("removed product {}", id);
        } else {
            debug!("remove: product {} not found", id);
        }
        removed
    }

    pub fn stats(&self) -> InventoryStats {
        let (total_units, total_value_cents) =
            self.products.iter().fold((0u64, 0u128), |(units, value), p| {
                (units + u64::from(p.quantity), value + p.value_cents())
            });
        InventoryStats {
            count: self.products.len(),
            height: self.products.height(),
            root: self.products.root_key(),
            total_units,
            total_value_cents,
        }
    }

    pub fn tree(&self) -> &AvlTree<Product> {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// True when products were added or removed since load or last save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
