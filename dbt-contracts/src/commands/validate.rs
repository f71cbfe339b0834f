// dbt-contracts/src/commands/validate.rs
//
// USE CASE: Structural or external validation of ODCS contracts.

use anyhow::{Context, bail};
use std::path::PathBuf;

use dbt_contracts_core::application::{validate_contracts, validate_directory};
use dbt_contracts_core::infrastructure::config::LoadedConfig;
use dbt_contracts_core::infrastructure::validation::{DatacontractCli, StructuralLinter};
use dbt_contracts_core::ports::ContractValidator;

use crate::cli::Engine;
use crate::commands::display_path;

pub fn execute(
    loaded: &LoadedConfig,
    contract: Option<PathBuf>,
    engine: Engine,
) -> anyhow::Result<()> {
    let project_dir = loaded.project_dir.as_path();
    let validator: Box<dyn ContractValidator> = match engine {
        Engine::Builtin => Box::new(StructuralLinter),
        Engine::Datacontract => Box::new(DatacontractCli::default()),
    };

    println!("🔎 Validating contracts ({})...", validator.name());
    let summary = match contract {
        Some(path) => validate_contracts(validator.as_ref(), &[path])?,
        None => {
            let root = project_dir.join(&loaded.config.paths.odcs_dir);
            validate_directory(validator.as_ref(), &root)
                .with_context(|| format!("Failed to validate contracts in {}", root.display()))?
        }
    };

    for checked in &summary.contracts {
        let shown = display_path(project_dir, &checked.path);
        if checked.report.passed {
            println!("   ✅ {shown}");
        } else {
            println!("   ❌ {shown}");
        }
        for message in &checked.report.messages {
            println!("      - {message}");
        }
    }

    let failed = summary.failed().count();
    if failed > 0 {
        bail!("{failed} of {} contract(s) failed validation", summary.contracts.len());
    }
    println!("✨ {} contract(s) valid.", summary.contracts.len());
    Ok(())
}
