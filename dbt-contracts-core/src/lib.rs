// dbt-contracts-core/src/lib.rs

// 1. Documentation is not mandatory yet
#![allow(missing_docs)]
// 2. Memory safety
#![deny(unsafe_code)]
// 3. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 4. Performance
#![warn(clippy::perf)]

// --- HEXAGONAL MODULES ---

// 1. Ports (Capabilities)
// Exporter, validator, persistence and snapshot contracts.
pub mod ports;

// 2. Domain (Business core)
// Contract/product models and the pure generation stages.
// Depends on nothing else (no infra, no app).
pub mod domain;

// 3. Infrastructure (Adapters)
// Filesystem, parsers, config providers, built-in exporter and linter.
// Depends on Domain and Ports.
pub mod infrastructure;

// 4. Application (Use Cases)
// Plan a product, apply a plan, batch planning, validation.
pub mod application;

// --- GLOBAL ERROR HANDLING ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
// use dbt_contracts_core::ContractsError;
pub use error::ContractsError;
