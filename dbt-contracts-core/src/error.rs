// dbt-contracts-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractsError {
    // --- DOMAIN ERRORS (resolution, merge, empty result) ---
    #[error(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE ERRORS (IO, parsing, config) ---
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- GENERIC / APPLICATION ERRORS ---
    #[error("Internal Error: {0}")]
    InternalError(String),
}

impl ContractsError {
    /// True when the run finished but produced nothing to write.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, ContractsError::Domain(DomainError::EmptyResult { .. }))
    }
}

// Manual implementation to avoid duplicate enum variant but keep ergonomics
impl From<std::io::Error> for ContractsError {
    fn from(err: std::io::Error) -> Self {
        ContractsError::Infrastructure(InfrastructureError::Io(err))
    }
}
