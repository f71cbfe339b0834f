// dbt-contracts-core/src/infrastructure/mod.rs

pub mod config;
pub mod discovery;
pub mod error;
pub mod exporter;
pub mod fs;
pub mod parser;
pub mod validation;
