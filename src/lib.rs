//! stockavl: an inventory of products kept in a height-balanced (AVL)
//! binary search tree.
//!
//! Layers, from the inside out:
//! - [`domain`]: the tree engine and the product record
//! - [`application`]: inventory state and snapshot persistence
//! - [`infrastructure`]: filesystem boundary and service wiring
//! - [`cli`]: argument parsing and command dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
