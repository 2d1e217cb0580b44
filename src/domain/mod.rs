//! Domain layer: the balanced tree engine and the inventory record
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod avl;
pub mod entities;
pub mod error;
pub mod render;

pub use avl::{AvlTree, InOrderIterator, Keyed};
pub use entities::*;
pub use error::{DomainError, DomainResult, DuplicateKeyError, InvariantViolation};
pub use render::TreeRender;
