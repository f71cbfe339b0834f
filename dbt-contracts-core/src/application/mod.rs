// dbt-contracts-core/src/application/mod.rs

pub mod apply;
pub mod batch;
pub mod generate;
pub mod validate;

// --- RE-EXPORTS (FACADE PATTERN) ---
// Lets the CLI write
// `use dbt_contracts_core::application::{Orchestrator, apply_plan};`
// without knowing the file layout.

pub use apply::{ApplyPolicy, ApplyReport, apply_plan};
pub use batch::{BatchOutcome, ProductResult, plan_products};
pub use generate::{GenerationOutcome, Orchestrator};
pub use validate::{ContractValidation, ValidationSummary, validate_contracts, validate_directory};
