// dbt-contracts-core/src/infrastructure/discovery.rs
//
// Finds contract and product files. Traversal is sorted by file name so the
// same tree always yields the same order.

use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};
use walkdir::WalkDir;

use crate::domain::contract_store::ContractStore;
use crate::error::ContractsError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::parser::load_contract;

const CONTRACT_SUFFIXES: [&str; 2] = [".odcs.yaml", ".odcs.yml"];
const PRODUCT_SUFFIXES: [&str; 2] = [".odps.yaml", ".odps.yml"];

fn has_suffix(path: &Path, suffixes: &[&str]) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| suffixes.iter().any(|suffix| name.ends_with(suffix)))
}

fn list_files(root: &Path, suffixes: &[&str]) -> Result<Vec<PathBuf>, InfrastructureError> {
    if !root.is_dir() {
        return Err(InfrastructureError::DirectoryNotFound(root.to_path_buf()));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name();
    for entry in walker {
        let entry = entry.map_err(|e| {
            InfrastructureError::Io(e.into_io_error().unwrap_or_else(|| {
                std::io::Error::other("filesystem loop while scanning")
            }))
        })?;
        if entry.file_type().is_file() && has_suffix(entry.path(), suffixes) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

pub fn list_contract_files(root: &Path) -> Result<Vec<PathBuf>, InfrastructureError> {
    list_files(root, &CONTRACT_SUFFIXES)
}

pub fn list_product_files(root: &Path) -> Result<Vec<PathBuf>, InfrastructureError> {
    list_files(root, &PRODUCT_SUFFIXES)
}

/// Load every contract under `root` into a store keyed by id.
///
/// Contracts without an id cannot be referenced and are skipped. A repeated
/// id fails the scan with both file paths.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn scan_contracts(root: &Path) -> Result<ContractStore, ContractsError> {
    let mut store = ContractStore::new();

    for path in list_contract_files(root)? {
        let contract = load_contract(&path)?;
        if contract.id.is_none() {
            warn!(path = %path.display(), "Skipping contract without id");
            continue;
        }
        store.insert(contract, &path)?;
    }

    info!(contracts = store.len(), "Contract store built");
    Ok(store)
}
