// dbt-contracts-core/src/domain/mod.rs

pub mod contract_store;
pub mod error;
pub mod generation;
pub mod odcs;
pub mod odps;
pub mod project;

// Re-exports
pub use contract_store::ContractStore;
pub use error::DomainError;
pub use odcs::Contract;
pub use odps::DataProduct;
