// dbt-contracts-core/src/infrastructure/exporter/mod.rs

pub mod dbt;
pub mod template;

pub use dbt::DbtExporter;
pub use template::SqlTemplate;
