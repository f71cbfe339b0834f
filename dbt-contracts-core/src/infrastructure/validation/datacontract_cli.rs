// dbt-contracts-core/src/infrastructure/validation/datacontract_cli.rs
//
// Delegates to the external `datacontract` CLI. Its exit status decides the
// verdict, its output becomes the messages.

use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;
use tracing::{debug, instrument};

use crate::error::ContractsError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::{ContractValidator, ValidationReport};

const DEFAULT_PROGRAM: &str = "datacontract";

#[derive(Debug, Clone)]
pub struct DatacontractCli {
    program: String,
}

impl Default for DatacontractCli {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
        }
    }
}

impl DatacontractCli {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl ContractValidator for DatacontractCli {
    fn name(&self) -> &'static str {
        "datacontract"
    }

    #[instrument(skip(self), fields(program = %self.program))]
    fn validate(&self, path: &Path) -> Result<ValidationReport, ContractsError> {
        let output = Command::new(&self.program)
            .arg("lint")
            .arg(path)
            .output()
            .map_err(|e| {
                let message = if e.kind() == ErrorKind::NotFound {
                    "not found on PATH (pip install datacontract-cli)".to_string()
                } else {
                    e.to_string()
                };
                InfrastructureError::ExternalTool {
                    tool: self.program.clone(),
                    message,
                }
            })?;

        let messages: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .chain(String::from_utf8_lossy(&output.stderr).lines())
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect();
        debug!(status = ?output.status, lines = messages.len(), "datacontract lint finished");

        Ok(ValidationReport {
            passed: output.status.success(),
            messages,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_is_an_error() {
        let cli = DatacontractCli::with_program("datacontract-this-does-not-exist");
        let err = cli.validate(Path::new("x.odcs.yaml")).unwrap_err();
        assert!(err.to_string().contains("datacontract-this-does-not-exist"));
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_status_decides() {
        let passing = DatacontractCli::with_program("true");
        assert!(passing.validate(Path::new("x.odcs.yaml")).unwrap().passed);

        let failing = DatacontractCli::with_program("false");
        assert!(!failing.validate(Path::new("x.odcs.yaml")).unwrap().passed);
    }
}
