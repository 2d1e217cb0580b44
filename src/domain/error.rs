//! Domain-level errors (no external dependencies)

use std::fmt;

use thiserror::Error;

/// Domain errors represent invalid records handed in by collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid price '{input}': {reason}")]
    InvalidPrice { input: String, reason: String },

    #[error("invalid product: {message}")]
    InvalidProduct { message: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Insertion was rejected because the key is already present.
///
/// Nothing in the tree was modified.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("record with key {key} already exists")]
pub struct DuplicateKeyError<K: fmt::Debug + fmt::Display> {
    pub key: K,
}

/// First structural invariant found broken by `AvlTree::check_invariants`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("stale height at key {key}: cached {cached}, actual {actual}")]
    Height {
        key: String,
        cached: usize,
        actual: usize,
    },

    #[error("unbalanced node at key {key}: balance factor {balance}")]
    Balance { key: String, balance: isize },

    #[error("key {key} is out of order")]
    Ordering { key: String },

    #[error("{stored} nodes stored but only {reachable} reachable from the root")]
    Unreachable { stored: usize, reachable: usize },
}
