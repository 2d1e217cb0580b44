//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::{DomainError, InvariantViolation, ProductId};
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("product {0} not found")]
    NotFound(ProductId),

    #[error("tree invariant broken: {0}")]
    Invariant(#[from] InvariantViolation),
}

impl From<ApplicationError> for CliError {
    fn from(err: ApplicationError) -> Self {
        Self::Infra(InfraError::Application(err))
    }
}

impl From<DomainError> for CliError {
    fn from(err: DomainError) -> Self {
        Self::from(ApplicationError::Domain(err))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) => crate::exitcode::USAGE,
            CliError::NotFound(_) => crate::exitcode::NOT_FOUND,
            CliError::Invariant(_) => crate::exitcode::SOFTWARE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Application(app) => match app {
                    ApplicationError::Domain(_) => crate::exitcode::USAGE,
                    ApplicationError::DuplicateProduct(_) => crate::exitcode::DATAERR,
                    ApplicationError::Snapshot { .. } => crate::exitcode::DATAERR,
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                    ApplicationError::OperationFailed { .. } => crate::exitcode::IOERR,
                },
            },
        }
    }
}
