// dbt-contracts-core/src/application/validate.rs

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use crate::error::ContractsError;
use crate::infrastructure::discovery::list_contract_files;
use crate::ports::{ContractValidator, ValidationReport};

#[derive(Debug, Clone, Serialize)]
pub struct ContractValidation {
    pub path: PathBuf,
    pub report: ValidationReport,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationSummary {
    pub engine: String,
    pub contracts: Vec<ContractValidation>,
}

impl ValidationSummary {
    pub fn passed(&self) -> bool {
        self.contracts.iter().all(|c| c.report.passed)
    }

    pub fn failed(&self) -> impl Iterator<Item = &ContractValidation> {
        self.contracts.iter().filter(|c| !c.report.passed)
    }
}

/// Validate the given contract files, in order.
#[instrument(skip_all, fields(engine = validator.name(), files = files.len()))]
pub fn validate_contracts(
    validator: &dyn ContractValidator,
    files: &[PathBuf],
) -> Result<ValidationSummary, ContractsError> {
    let mut contracts = Vec::with_capacity(files.len());
    for path in files {
        let report = validator.validate(path)?;
        if !report.passed {
            warn!(path = %path.display(), problems = report.messages.len(), "Contract failed validation");
        }
        contracts.push(ContractValidation {
            path: path.clone(),
            report,
        });
    }

    let summary = ValidationSummary {
        engine: validator.name().to_string(),
        contracts,
    };
    info!(passed = summary.passed(), "Validation finished");
    Ok(summary)
}

/// Validate every `*.odcs.yaml` under `root`.
pub fn validate_directory(
    validator: &dyn ContractValidator,
    root: &Path,
) -> Result<ValidationSummary, ContractsError> {
    let files = list_contract_files(root)?;
    validate_contracts(validator, &files)
}
