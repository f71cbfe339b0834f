// dbt-contracts-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("No ODCS contract found with id '{id}'")]
    #[diagnostic(
        code(dbt_contracts::domain::contract_not_found),
        help("Check the port's contractId against the `id` field of your *.odcs.yaml files.")
    )]
    ContractNotFound { id: String },

    #[error("Contract id '{id}' is declared twice: {first} and {second}")]
    #[diagnostic(
        code(dbt_contracts::domain::duplicate_contract),
        help("Contract ids must be unique across the contract directory.")
    )]
    DuplicateContractId {
        id: String,
        first: String,
        second: String,
    },

    #[error("Contract at {path} has no id")]
    #[diagnostic(
        code(dbt_contracts::domain::missing_id),
        help("Every ODCS contract referenced by a port needs a top-level `id`.")
    )]
    MissingContractId { path: String },

    #[error("Merge conflict in {document}: entry '{key}' is produced by contracts {contracts:?}")]
    #[diagnostic(
        code(dbt_contracts::domain::merge_conflict),
        help(
            "Rename one of the ports/tables, or set generation.merge_conflicts = \"last-writer-wins\"."
        )
    )]
    MergeConflict {
        document: String,
        key: String,
        contracts: Vec<String>,
    },

    #[error("Target path '{path}' is generated twice (models {models:?})")]
    #[diagnostic(code(dbt_contracts::domain::duplicate_target))]
    DuplicateTargetPath { path: String, models: Vec<String> },

    #[error("Product '{product}' produced no artifacts")]
    #[diagnostic(
        code(dbt_contracts::domain::empty_result),
        help("Declare at least one input or output port with a resolvable contract.")
    )]
    EmptyResult { product: String },

    #[error("Invalid {kind} fragment from contract '{contract}': {reason}")]
    #[diagnostic(code(dbt_contracts::domain::fragment))]
    InvalidFragment {
        kind: String,
        contract: String,
        reason: String,
    },

    #[error("Export failed for contract '{contract}': {reason}")]
    #[diagnostic(code(dbt_contracts::domain::export))]
    Export { contract: String, reason: String },
}
