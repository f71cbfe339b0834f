// dbt-contracts-core/src/domain/project/mod.rs

pub mod configuration;
pub use configuration::{Config, ConflictPolicy, GenerationConfig, PathsConfig, ValidationConfig};
