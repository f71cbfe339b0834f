// dbt-contracts-core/src/infrastructure/error.rs

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(dbt_contracts::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- YAML (contracts, products, fragments) ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(dbt_contracts::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse {path}: {source}")]
    #[diagnostic(code(dbt_contracts::infra::document))]
    Document {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    // --- CONFIG / TOML ---
    #[error("TOML Parsing Error in {path}: {message}")]
    #[diagnostic(
        code(dbt_contracts::infra::toml),
        help("Unknown keys are rejected. Run `dbt-contracts config set` to see the valid keys.")
    )]
    TomlError { path: PathBuf, message: String },

    #[error("Configuration Error: {0}")]
    #[diagnostic(code(dbt_contracts::infra::config))]
    ConfigError(String),

    #[error("Directory not found: '{0}'")]
    #[diagnostic(code(dbt_contracts::infra::dir_missing))]
    DirectoryNotFound(PathBuf),

    // --- TEMPLATING ---
    #[error("Template Rendering Error: {0}")]
    #[diagnostic(
        code(dbt_contracts::infra::template),
        help("The built-in SQL template failed to render.")
    )]
    TemplateError(#[from] minijinja::Error),

    // --- EXTERNAL TOOLS ---
    #[error("External tool '{tool}' failed: {message}")]
    #[diagnostic(
        code(dbt_contracts::infra::external_tool),
        help("Make sure the tool is installed and available on PATH.")
    )]
    ExternalTool { tool: String, message: String },
}
