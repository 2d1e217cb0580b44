//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::{DomainError, DuplicateKeyError, ProductId};

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("product with id {0} already exists")]
    DuplicateProduct(ProductId),

    #[error("snapshot {path}: {message}")]
    Snapshot { path: PathBuf, message: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<DuplicateKeyError<ProductId>> for ApplicationError {
    fn from(err: DuplicateKeyError<ProductId>) -> Self {
        Self::DuplicateProduct(err.key)
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
