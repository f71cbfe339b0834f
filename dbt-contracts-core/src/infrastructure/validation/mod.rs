// dbt-contracts-core/src/infrastructure/validation/mod.rs

pub mod datacontract_cli;
pub mod lint;

pub use datacontract_cli::DatacontractCli;
pub use lint::StructuralLinter;
