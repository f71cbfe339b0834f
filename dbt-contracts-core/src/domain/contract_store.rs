// dbt-contracts-core/src/domain/contract_store.rs
//
// Contracts indexed by id, built once per run. Duplicate ids are refused at
// insertion so resolution never depends on traversal order.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::domain::error::DomainError;
use crate::domain::odcs::Contract;

#[derive(Debug, Clone)]
pub struct StoredContract {
    pub contract: Contract,
    pub path: PathBuf,
}

#[derive(Debug, Default, Clone)]
pub struct ContractStore {
    by_id: BTreeMap<String, StoredContract>,
}

impl ContractStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a contract under its id. Fails on a second contract with the same id.
    pub fn insert(&mut self, contract: Contract, path: &Path) -> Result<(), DomainError> {
        let Some(id) = contract.id.clone() else {
            return Err(DomainError::MissingContractId {
                path: path.display().to_string(),
            });
        };

        if let Some(existing) = self.by_id.get(&id) {
            return Err(DomainError::DuplicateContractId {
                id,
                first: existing.path.display().to_string(),
                second: path.display().to_string(),
            });
        }

        self.by_id.insert(
            id,
            StoredContract {
                contract,
                path: path.to_path_buf(),
            },
        );
        Ok(())
    }

    pub fn resolve(&self, id: &str) -> Result<&Contract, DomainError> {
        self.by_id
            .get(id)
            .map(|stored| &stored.contract)
            .ok_or_else(|| DomainError::ContractNotFound { id: id.to_string() })
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoredContract> {
        self.by_id.values()
    }
}
