// dbt-contracts-core/src/ports/validator.rs

use serde::Serialize;
use std::path::Path;

use crate::error::ContractsError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub passed: bool,
    pub messages: Vec<String>,
}

impl ValidationReport {
    pub fn from_messages(messages: Vec<String>) -> Self {
        Self {
            passed: messages.is_empty(),
            messages,
        }
    }
}

/// Structural check of one contract file. `Err` means the check could not
/// run at all, a failing contract is a report with `passed: false`.
pub trait ContractValidator: Send + Sync {
    fn name(&self) -> &'static str;
    fn validate(&self, path: &Path) -> Result<ValidationReport, ContractsError>;
}
