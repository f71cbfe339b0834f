// dbt-contracts-core/src/infrastructure/config/project.rs
//
// Resolves the configuration once at start-up. Providers are tried in order,
// the first one present wins, then environment overrides are layered on top.

use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::domain::project::Config;
use crate::infrastructure::config::settings::{apply_env_overrides, table_to_config};
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::atomic_write;

pub const CONFIG_FILE_NAME: &str = "dbt-contracts.toml";
const PYPROJECT_TABLE: &str = "dbt-contracts";

/// Where the resolved configuration came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "provider", content = "path", rename_all = "kebab-case")]
pub enum ConfigOrigin {
    Explicit(PathBuf),
    ProjectFile(PathBuf),
    ContractsFile(PathBuf),
    Pyproject(PathBuf),
    Defaults,
}

impl ConfigOrigin {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigOrigin::Explicit(p)
            | ConfigOrigin::ProjectFile(p)
            | ConfigOrigin::ContractsFile(p)
            | ConfigOrigin::Pyproject(p) => Some(p),
            ConfigOrigin::Defaults => None,
        }
    }
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigOrigin::Explicit(p) => write!(f, "{} (--config)", p.display()),
            ConfigOrigin::ProjectFile(p) | ConfigOrigin::ContractsFile(p) => {
                write!(f, "{}", p.display())
            }
            ConfigOrigin::Pyproject(p) => {
                write!(f, "{} [tool.{PYPROJECT_TABLE}]", p.display())
            }
            ConfigOrigin::Defaults => f.write_str("built-in defaults"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub origin: ConfigOrigin,
    pub project_dir: PathBuf,
}

impl LoadedConfig {
    /// File that `config set` writes: the explicit or winning file, else
    /// `dbt-contracts.toml` in the project root.
    pub fn writable_path(&self) -> PathBuf {
        match &self.origin {
            ConfigOrigin::Explicit(p) | ConfigOrigin::ProjectFile(p) | ConfigOrigin::ContractsFile(p) => {
                p.clone()
            }
            ConfigOrigin::Pyproject(_) | ConfigOrigin::Defaults => {
                self.project_dir.join(CONFIG_FILE_NAME)
            }
        }
    }
}

/// Explicit path -> `dbt-contracts.toml` -> `contracts/dbt-contracts.toml`
/// -> `[tool.dbt-contracts]` in `pyproject.toml` -> defaults, then
/// `DBT_CONTRACTS_*` from the process environment.
#[instrument(skip_all, fields(project_dir = %project_dir.display()))]
pub fn load_config(
    project_dir: &Path,
    explicit: Option<&Path>,
) -> Result<LoadedConfig, InfrastructureError> {
    load_config_with_env(project_dir, explicit, |name| std::env::var(name).ok())
}

pub fn load_config_with_env<F>(
    project_dir: &Path,
    explicit: Option<&Path>,
    env: F,
) -> Result<LoadedConfig, InfrastructureError>
where
    F: Fn(&str) -> Option<String>,
{
    let (config, origin) = resolve_file(project_dir, explicit)?;
    info!(origin = %origin, "Configuration resolved");
    let config = apply_env_overrides(config, env)?;

    Ok(LoadedConfig {
        config,
        origin,
        project_dir: project_dir.to_path_buf(),
    })
}

fn resolve_file(
    project_dir: &Path,
    explicit: Option<&Path>,
) -> Result<(Config, ConfigOrigin), InfrastructureError> {
    // 1. Explicit path must exist
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(InfrastructureError::ConfigError(format!(
                "Config file {} does not exist",
                path.display()
            )));
        }
        return Ok((load_toml(path)?, ConfigOrigin::Explicit(path.to_path_buf())));
    }

    // 2. Project root, then the contracts folder
    let project_file = project_dir.join(CONFIG_FILE_NAME);
    if project_file.is_file() {
        return Ok((load_toml(&project_file)?, ConfigOrigin::ProjectFile(project_file)));
    }
    let contracts_file = project_dir.join("contracts").join(CONFIG_FILE_NAME);
    if contracts_file.is_file() {
        return Ok((
            load_toml(&contracts_file)?,
            ConfigOrigin::ContractsFile(contracts_file),
        ));
    }

    // 3. pyproject.toml, only when it has our table
    let pyproject = project_dir.join("pyproject.toml");
    if pyproject.is_file()
        && let Some(config) = load_pyproject(&pyproject)?
    {
        return Ok((config, ConfigOrigin::Pyproject(pyproject)));
    }

    // 4. Defaults
    Ok((Config::default(), ConfigOrigin::Defaults))
}

fn parse_table(path: &Path) -> Result<toml::Table, InfrastructureError> {
    let content = fs::read_to_string(path)?;
    content
        .parse::<toml::Table>()
        .map_err(|e| InfrastructureError::TomlError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

fn load_toml(path: &Path) -> Result<Config, InfrastructureError> {
    table_to_config(parse_table(path)?, path)
}

fn load_pyproject(path: &Path) -> Result<Option<Config>, InfrastructureError> {
    let mut table = parse_table(path)?;
    let Some(toml::Value::Table(mut tool)) = table.remove("tool") else {
        return Ok(None);
    };
    match tool.remove(PYPROJECT_TABLE) {
        Some(toml::Value::Table(ours)) => table_to_config(ours, path).map(Some),
        _ => Ok(None),
    }
}

/// Resolved configuration rendered as TOML, for `config show`.
pub fn render_config(config: &Config) -> Result<String, InfrastructureError> {
    toml::to_string_pretty(config).map_err(|e| InfrastructureError::ConfigError(e.to_string()))
}

/// `config export`: the resolved configuration, written to `path`.
pub fn export_config(config: &Config, path: &Path) -> Result<(), InfrastructureError> {
    atomic_write(path, render_config(config)?)?;
    info!(path = %path.display(), "Configuration exported");
    Ok(())
}

/// `config import`: validate `source` as a complete configuration, then
/// write it to `target`. Nothing is written when validation fails.
pub fn import_config(source: &Path, target: &Path) -> Result<Config, InfrastructureError> {
    let table = parse_table(source)?;
    let config = table_to_config(table.clone(), source)?;

    let rendered = toml::to_string_pretty(&table)
        .map_err(|e| InfrastructureError::ConfigError(e.to_string()))?;
    atomic_write(target, rendered)?;
    info!(from = %source.display(), to = %target.display(), "Configuration imported");
    Ok(config)
}
